//! Metrics definitions for session transfer.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TRUST_LOGIN_SUCCESS: MetricDef = MetricDef {
    name: "trust_login.success",
    metric_type: MetricType::Counter,
    description: "Transfer tokens redeemed into a session",
};

pub const TRUST_LOGIN_INVALID_TOKEN: MetricDef = MetricDef {
    name: "trust_login.invalid_token",
    metric_type: MetricType::Counter,
    description: "Redemptions of unknown, expired, or already-used tokens",
};

pub const TRUST_LOGIN_INVALID_DOMAIN: MetricDef = MetricDef {
    name: "trust_login.invalid_domain",
    metric_type: MetricType::Counter,
    description: "Tokens presented on a host they were not issued for",
};

pub const TRUST_LOGIN_SESSION_ERROR: MetricDef = MetricDef {
    name: "trust_login.session_error",
    metric_type: MetricType::Counter,
    description: "Consumed tokens whose session issuance then failed",
};

pub const ALL_METRICS: &[MetricDef] = &[
    TRUST_LOGIN_SUCCESS,
    TRUST_LOGIN_INVALID_TOKEN,
    TRUST_LOGIN_INVALID_DOMAIN,
    TRUST_LOGIN_SESSION_ERROR,
];
