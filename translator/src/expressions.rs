//! Boolean match expressions in the gateway's router expression language.
//!
//! Composite matchers parenthesize each operand once there is more than one, so
//! `Or([a])` renders as `a` while `Or([a, b])` renders as `(a) || (b)`.

use itertools::Itertools;
use kongress_api::constants::GATEWAY_PATH_REGEX_PREFIX;
use std::fmt::{Display, Formatter};

pub const FIELD_NET_DST_PORT: &str = "net.dst.port";
pub const FIELD_NET_PROTOCOL: &str = "net.protocol";
pub const FIELD_HTTP_HOST: &str = "http.host";
pub const FIELD_HTTP_PATH: &str = "http.path";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Prefix,
    Postfix,
    Regex,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equals => "==",
            Self::Prefix => "^=",
            Self::Postfix => "=^",
            Self::Regex => "~",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Predicate {
        field: &'static str,
        operator: Operator,
        value: Literal,
    },
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
}

impl Matcher {
    pub fn predicate(field: &'static str, operator: Operator, value: Literal) -> Self {
        Self::Predicate {
            field,
            operator,
            value,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Predicate { .. } => false,
            Self::And(matchers) | Self::Or(matchers) => matchers.iter().all(Matcher::is_empty),
        }
    }

    pub fn expression(&self) -> String {
        self.to_string()
    }
}

fn write_joined(f: &mut Formatter<'_>, matchers: &[Matcher], separator: &str) -> std::fmt::Result {
    let matchers = matchers.iter().filter(|m| !m.is_empty()).collect_vec();
    match matchers.as_slice() {
        [] => Ok(()),
        [only] => write!(f, "{only}"),
        many => write!(f, "{}", many.iter().map(|m| format!("({m})")).join(separator)),
    }
}

impl Display for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predicate {
                field,
                operator,
                value,
            } => write!(f, "{field} {operator} {value}"),
            Self::And(matchers) => write_joined(f, matchers, " && "),
            Self::Or(matchers) => write_joined(f, matchers, " || "),
        }
    }
}

/// ORs one destination port equality per backend, keeping backend order.
pub fn compile_port_expression<I: IntoIterator<Item = i32>>(ports: I) -> String {
    Matcher::Or(
        ports
            .into_iter()
            .map(|port| {
                Matcher::predicate(
                    FIELD_NET_DST_PORT,
                    Operator::Equals,
                    Literal::Int(i64::from(port)),
                )
            })
            .collect(),
    )
    .expression()
}

fn protocol_matcher(protocols: &[String]) -> Matcher {
    Matcher::Or(
        protocols
            .iter()
            .map(|protocol| {
                Matcher::predicate(
                    FIELD_NET_PROTOCOL,
                    Operator::Equals,
                    Literal::Str(protocol.clone()),
                )
            })
            .collect(),
    )
}

fn host_matcher(host: &str) -> Matcher {
    match host.strip_prefix('*') {
        Some(suffix) => Matcher::predicate(
            FIELD_HTTP_HOST,
            Operator::Postfix,
            Literal::Str(suffix.to_string()),
        ),
        None => Matcher::predicate(
            FIELD_HTTP_HOST,
            Operator::Equals,
            Literal::Str(host.to_string()),
        ),
    }
}

/// Regex-marked paths match as anchored regular expressions; anything else as a prefix.
fn path_matcher(path: &str) -> Matcher {
    match path.strip_prefix(GATEWAY_PATH_REGEX_PREFIX) {
        Some(regex) => {
            let anchored = if regex.starts_with('^') {
                regex.to_string()
            } else {
                format!("^{regex}")
            };
            Matcher::predicate(FIELD_HTTP_PATH, Operator::Regex, Literal::Str(anchored))
        }
        None => Matcher::predicate(
            FIELD_HTTP_PATH,
            Operator::Prefix,
            Literal::Str(path.to_string()),
        ),
    }
}

/// Builds the expression for an HTTP route: protocol, then host (when set), then paths.
pub fn compile_http_expression(
    protocols: &[String],
    host: Option<&str>,
    paths: &[String],
) -> String {
    let mut matchers = vec![protocol_matcher(protocols)];
    if let Some(host) = host.filter(|host| !host.is_empty()) {
        matchers.push(host_matcher(host));
    }
    matchers.push(Matcher::Or(paths.iter().map(|p| path_matcher(p)).collect()));

    Matcher::And(matchers).expression()
}
