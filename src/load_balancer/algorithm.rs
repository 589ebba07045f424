//! Selection algorithm names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::load_balancer::{
    always_first::AlwaysFirst, least_conn::LeastConnections, least_latency::LeastLatency,
    round_robin::RoundRobin, LoadBalancer,
};

/// The policy a pool uses to pick a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Algorithm {
    #[serde(rename = "alwaysfirst")]
    AlwaysFirst,
    #[default]
    #[serde(rename = "roundrobin")]
    RoundRobin,
    #[serde(rename = "leastlatency")]
    LeastLatency,
    #[serde(rename = "fewestconn")]
    FewestConnections,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::AlwaysFirst,
        Algorithm::RoundRobin,
        Algorithm::LeastLatency,
        Algorithm::FewestConnections,
    ];

    /// Identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::AlwaysFirst => "alwaysfirst",
            Algorithm::RoundRobin => "roundrobin",
            Algorithm::LeastLatency => "leastlatency",
            Algorithm::FewestConnections => "fewestconn",
        }
    }

    /// Build a fresh selector for this algorithm.
    pub fn balancer(&self) -> Box<dyn LoadBalancer> {
        match self {
            Algorithm::AlwaysFirst => Box::new(AlwaysFirst),
            Algorithm::RoundRobin => Box::new(RoundRobin::new()),
            Algorithm::LeastLatency => Box::new(LeastLatency),
            Algorithm::FewestConnections => Box::new(LeastConnections),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown algorithm '{0}' (expected alwaysfirst, roundrobin, leastlatency or fewestconn)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}
