pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const USER_AGENT: &str = "geonetwork-mcp/0.3";
}

pub mod search {
    pub const DEFAULT_SIZE: u64 = 10;
    pub const MAX_SIZE: u64 = 100;
    pub const FACET_BUCKETS: u64 = 20;
    pub const BUCKET: &str = "metadata";
}

pub mod session {
    pub const PRIMARY_COOKIE: &str = "JSESSIONID";
    pub const SECONDARY_COOKIE: &str = "SESSION";
    pub const SIGNIN_PATH: &str = "signin";
    pub const INFO_PATH: &str = "me";
    pub const API_SUFFIX: &str = "/srv/api";
}

pub mod schema {
    pub const ISO19139_MARKERS: &[&str] = &["gmd:MD_Metadata", "http://www.isotc211.org/2005/gmd"];
    pub const ISO19115_3_MARKERS: &[&str] = &[
        "mdb:MD_Metadata",
        "http://standards.iso.org/iso/19115/-3/mdb/",
    ];
    pub const ISO19139_TITLE_XPATH: &str =
        "gmd:identificationInfo/*/gmd:citation/*/gmd:title/gco:CharacterString";
    pub const ISO19115_3_TITLE_XPATH: &str =
        "mdb:identificationInfo/*/mri:citation/*/cit:title/gco:CharacterString";
}

pub mod limits {
    pub const ERROR_BODY_BYTES: usize = 4 * 1024;
    pub const LOG_SUBSTRING_LENGTH: usize = 100;
}
