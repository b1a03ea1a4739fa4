pub mod dispatcher;
pub mod logger;
pub mod session;
pub mod transport;
