use hopper_core::{BucketWidth, Link};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub id: String,
    pub url: String,
    pub target: String,
    pub redirect: u16,
}

impl CreateLinkResponse {
    pub fn new(link: &Link, base_url: &str) -> Self {
        Self {
            id: link.public_id().to_string(),
            url: link.public_id().to_url(base_url),
            target: link.target().to_string(),
            redirect: link.redirect().as_u16(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadLinkResponse {
    pub id: String,
    pub url: String,
    pub target: String,
    pub redirect: u16,
    pub per: String,
    pub visits: BTreeMap<String, usize>,
}

impl ReadLinkResponse {
    pub fn new(link: &Link, base_url: &str, per: BucketWidth) -> Self {
        Self {
            id: link.public_id().to_string(),
            url: link.public_id().to_url(base_url),
            target: link.target().to_string(),
            redirect: link.redirect().as_u16(),
            per: per.to_string(),
            visits: link.visits_per(per),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VisitLinkResponse {
    pub target: String,
    pub redirect: u16,
}

impl From<&Link> for VisitLinkResponse {
    fn from(link: &Link) -> Self {
        Self {
            target: link.target().to_string(),
            redirect: link.redirect().as_u16(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VisitStatsResponse {
    pub id: String,
    pub per: String,
    pub visits: BTreeMap<String, usize>,
}
