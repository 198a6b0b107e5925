//! Display state derived from a session snapshot.

use crate::state::{Phase, SessionState};
use serde::Serialize;
use wallet_client::Config;

/// Everything a front-end needs to render the calculator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub network: String,
    pub program_id: String,
    pub connected: bool,
    pub connecting: bool,
    pub short_address: Option<String>,
    pub balance: Option<String>,
    pub processing: bool,
    pub can_submit: bool,
    pub can_clear: bool,
    pub operation_symbol: &'static str,
    /// `"10 ÷ 4 = 2.5"`, shown once either operand has text
    pub expression: Option<String>,
    pub result: Option<f64>,
    pub status: Option<&'static str>,
    pub signature: Option<String>,
    pub explorer_url: Option<String>,
    pub error_message: Option<String>,
}

impl SessionView {
    #[must_use]
    pub fn new(state: &SessionState, config: &Config) -> Self {
        let connected = state.wallet.is_connected;
        let processing = state.submission.phase.is_in_flight();
        let operation_symbol = state
            .input
            .parsed_operation()
            .map_or("+", |operation| operation.symbol());

        Self {
            network: config.network.name.clone(),
            program_id: config.network.program_id.clone(),
            connected,
            connecting: state.connecting,
            short_address: state
                .wallet
                .address
                .as_deref()
                .filter(|_| connected)
                .map(short_address),
            balance: connected.then(|| format!("{:.4} SOL", state.wallet.balance)),
            processing,
            can_submit: connected && !processing && state.input.has_both_operands(),
            can_clear: connected,
            operation_symbol,
            expression: expression(state, operation_symbol),
            result: state.submission.result,
            status: status_label(state.submission.phase),
            signature: state.submission.signature.clone(),
            explorer_url: state
                .submission
                .signature
                .as_deref()
                .map(|signature| config.explorer_link(signature)),
            error_message: state
                .submission
                .error_message
                .clone()
                .or_else(|| state.wallet_error.clone()),
        }
    }
}

/// First and last four characters of an address
#[must_use]
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        if value.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else {
        value.to_string()
    }
}

const fn status_label(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Pending => Some("Confirming..."),
        Phase::Confirmed => Some("Confirmed"),
        Phase::Failed => Some("Failed"),
        Phase::Idle | Phase::Processing => None,
    }
}

fn expression(state: &SessionState, symbol: &str) -> Option<String> {
    let input = &state.input;
    if input.operand1.is_empty() && input.operand2.is_empty() {
        return None;
    }

    let or_placeholder = |raw: &str| if raw.is_empty() { "?".to_string() } else { raw.to_string() };
    let mut line = format!(
        "{} {} {}",
        or_placeholder(&input.operand1),
        symbol,
        or_placeholder(&input.operand2)
    );

    if let Some(result) = state.submission.result {
        line.push_str(" = ");
        line.push_str(&format_number(result));
    }

    Some(line)
}
