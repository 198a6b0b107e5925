use crate::controller::mark_connected;
use crate::{
    CalculatorSession, OperandSlot, Phase, SessionError, SubmissionState, CONNECT_FAILED_MESSAGE,
    SUBMISSION_INTERRUPTED_MESSAGE,
};
use calculator_lib::{is_base58, CalcError, Operation, SIGNATURE_LENGTH};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing_test::traced_test;
use wallet_client::{
    Config, MemoryClipboard, ProviderEvent, StubBalanceClient, StubWalletProvider, WalletError,
};

const ADDRESS: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
const OTHER_ADDRESS: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

fn stub_provider() -> Arc<StubWalletProvider> {
    Arc::new(StubWalletProvider::new(ADDRESS))
}

async fn connected_session() -> (CalculatorSession, Arc<StubWalletProvider>) {
    let provider = stub_provider();
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .start()
        .await;
    session.connect().await.unwrap();
    (session, provider)
}

fn fill(session: &CalculatorSession, a: &str, b: &str, operation: Operation) {
    session.set_operand(OperandSlot::First, a);
    session.set_operand(OperandSlot::Second, b);
    session.set_operation(operation);
}

/// Let the provider event listener drain its queue
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn wait_for_pending(session: &CalculatorSession) {
    while session.state().submission.phase != Phase::Pending {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_submit_confirms_after_delay() {
    let (session, _provider) = connected_session().await;
    fill(&session, "10", "4", Operation::Divide);

    let started = Instant::now();
    let receipt = session.submit().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(2000));

    assert_eq!(receipt.result, 2.5);
    assert_eq!(receipt.signature.len(), SIGNATURE_LENGTH);
    assert!(is_base58(&receipt.signature));

    let state = session.state();
    assert_eq!(state.submission.phase, Phase::Confirmed);
    assert_eq!(state.submission.result, Some(2.5));
    assert_eq!(state.submission.signature.as_deref(), Some(receipt.signature.as_str()));
    assert!(state.submission.error_message.is_none());
    assert_eq!(session.view().expression.as_deref(), Some("10 ÷ 4 = 2.5"));

    assert!(logs_contain("Calculation confirmed"));
}

#[tokio::test(start_paused = true)]
async fn test_each_operation() {
    let (session, _provider) = connected_session().await;

    for (a, b, operation, expected) in [
        ("2", "3", Operation::Add, 5.0),
        ("10", "4", Operation::Subtract, 6.0),
        ("1.5", "2", Operation::Multiply, 3.0),
        (" 9 ", "3", Operation::Divide, 3.0),
        ("-4", "2", Operation::Multiply, -8.0),
    ] {
        fill(&session, a, b, operation);
        let receipt = session.submit().await.unwrap();
        assert_eq!(receipt.result, expected, "{a} {operation} {b}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_overflow_is_a_result() {
    let (session, _provider) = connected_session().await;
    fill(&session, "1e308", "10", Operation::Multiply);

    let receipt = session.submit().await.unwrap();
    assert!(receipt.result.is_infinite());
    assert_eq!(session.state().submission.phase, Phase::Confirmed);
    assert_eq!(
        session.view().expression.as_deref(),
        Some("1e308 × 10 = Infinity")
    );
}

#[tokio::test(start_paused = true)]
async fn test_divide_by_zero_stays_idle() {
    let (session, _provider) = connected_session().await;

    for zero in ["0", "-0", "0.0"] {
        fill(&session, "7", zero, Operation::Divide);
        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Calc(CalcError::DivideByZero)));

        let state = session.state();
        assert_eq!(state.submission.phase, Phase::Idle);
        assert!(state.submission.signature.is_none());
        assert_eq!(
            state.submission.error_message.as_deref(),
            Some("Division by zero is not allowed")
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_validation_errors() {
    let (session, _provider) = connected_session().await;

    fill(&session, "5", "", Operation::Add);
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Calc(CalcError::MissingOperand)));
    assert_eq!(
        session.state().submission.error_message.as_deref(),
        Some("Please enter both operands")
    );

    fill(&session, "abc", "2", Operation::Add);
    let err = session.submit().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        session.state().submission,
        SubmissionState::rejected("Please enter valid numbers".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_drops_previous_result() {
    let (session, _provider) = connected_session().await;
    fill(&session, "2", "3", Operation::Add);
    session.submit().await.unwrap();

    session.set_operand(OperandSlot::Second, "");
    assert!(session.submit().await.is_err());

    let state = session.state();
    assert_eq!(state.submission.phase, Phase::Idle);
    assert!(state.submission.result.is_none());
    assert!(state.submission.signature.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_submit_requires_connection() {
    let session = CalculatorSession::builder(Config::default())
        .provider(stub_provider())
        .start()
        .await;

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Calc(CalcError::NotConnected)));
    assert_eq!(
        session.view().error_message.as_deref(),
        Some("Please connect your wallet first")
    );
    assert!(!session.view().can_submit);
}

#[tokio::test(start_paused = true)]
async fn test_second_submit_rejected_while_in_flight() {
    let (session, _provider) = connected_session().await;
    fill(&session, "6", "7", Operation::Multiply);
    let session = Arc::new(session);

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_pending(&session).await;

    assert!(session.view().processing);
    assert!(!session.view().can_submit);
    assert!(matches!(
        session.submit().await,
        Err(SessionError::SubmissionInFlight)
    ));

    let receipt = task.await.unwrap().unwrap();
    assert_eq!(receipt.result, 42.0);
    assert_eq!(session.state().submission.phase, Phase::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_clear_during_pending_supersedes() {
    let (session, _provider) = connected_session().await;
    fill(&session, "1", "2", Operation::Add);
    let session = Arc::new(session);

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_pending(&session).await;

    session.clear();
    assert!(matches!(task.await.unwrap(), Err(SessionError::Superseded)));

    // Nothing is written once the scheduled delay has passed
    tokio::time::sleep(Duration::from_millis(3000)).await;
    let state = session.state();
    assert_eq!(state.submission, SubmissionState::default());
    assert_eq!(state.input.operand1, "");
    assert!(state.wallet.is_connected);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_pending_supersedes() {
    let (session, provider) = connected_session().await;
    fill(&session, "1", "2", Operation::Add);
    let session = Arc::new(session);

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_pending(&session).await;

    session.disconnect().await;
    assert!(matches!(task.await.unwrap(), Err(SessionError::Superseded)));
    settle().await;

    let state = session.state();
    assert!(!state.wallet.is_connected);
    assert_eq!(state.submission, SubmissionState::default());
    assert!(!provider.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_submission() {
    let (session, _provider) = connected_session().await;
    fill(&session, "1", "2", Operation::Add);
    let session = Arc::new(session);

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_pending(&session).await;

    session.shutdown().await;
    assert!(matches!(task.await.unwrap(), Err(SessionError::Cancelled)));
    assert!(session.is_shut_down());
    assert_eq!(session.state().submission.phase, Phase::Pending);

    assert!(matches!(session.submit().await, Err(SessionError::Cancelled)));
    assert!(matches!(session.connect().await, Err(SessionError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_operation_fails_after_delay() {
    let (session, _provider) = connected_session().await;
    fill(&session, "1", "2", Operation::Add);
    session.set_operation_key("modulo");

    let err = session.submit().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Calc(CalcError::UnknownOperation(ref key)) if key == "modulo"
    ));

    let state = session.state();
    assert_eq!(state.submission.phase, Phase::Failed);
    assert_eq!(state.submission.error_message.as_deref(), Some("Invalid operation"));
    assert!(state.submission.signature.is_some());
    assert!(state.submission.result.is_none());
    assert_eq!(session.view().status, Some("Failed"));

    // A failed submission may be retried straight away
    session.set_operation(Operation::Add);
    let receipt = session.submit().await.unwrap();
    assert_eq!(receipt.result, 3.0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_is_idempotent() {
    let (session, _provider) = connected_session().await;
    fill(&session, "4", "5", Operation::Divide);
    session.submit().await.unwrap();

    session.clear();
    let once = session.state();
    session.clear();
    let twice = session.state();

    assert_eq!(once, twice);
    assert_eq!(twice.input.operand1, "");
    assert_eq!(twice.input.operand2, "");
    assert_eq!(twice.input.operation, "divide");
    assert_eq!(twice.submission, SubmissionState::default());
    assert!(twice.wallet.is_connected);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_disconnect_resets_everything() {
    let (session, _provider) = connected_session().await;
    fill(&session, "4", "5", Operation::Subtract);
    session.submit().await.unwrap();

    session.disconnect().await;
    let state = session.state();
    assert!(!state.wallet.is_connected);
    assert!(state.wallet.address.is_none());
    assert_eq!(state.wallet.balance, 0.0);
    assert_eq!(state.input.operand1, "");
    assert_eq!(state.input.operation, "subtract");
    assert_eq!(state.submission, SubmissionState::default());
    assert!(logs_contain("Wallet disconnected"));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_when_never_connected() {
    let session = CalculatorSession::builder(Config::default()).build();
    session.disconnect().await;
    assert!(!session.state().wallet.is_connected);
    assert!(session.state().wallet_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_failure_still_disconnects() {
    let (session, provider) = connected_session().await;
    provider.set_fail_disconnect(true);

    session.disconnect().await;
    assert!(!session.state().wallet.is_connected);
}

#[tokio::test(start_paused = true)]
async fn test_connect_without_provider() {
    let session = CalculatorSession::builder(Config::default()).start().await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Wallet(WalletError::ProviderUnavailable)
    ));
    assert_eq!(
        session.view().error_message.as_deref(),
        Some("Wallet provider not found. Please install a wallet extension.")
    );
    assert!(!session.state().wallet.is_connected);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_connect_failure_sets_message() {
    let provider = stub_provider();
    provider.set_fail_connect(true);
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .build();

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::Wallet(WalletError::ConnectRejected(_))));

    let state = session.state();
    assert!(!state.connecting);
    assert!(!state.wallet.is_connected);
    assert_eq!(state.wallet_error.as_deref(), Some(CONNECT_FAILED_MESSAGE));
    assert!(logs_contain("Failed to connect wallet"));

    // A later success clears the message
    provider.set_fail_connect(false);
    session.connect().await.unwrap();
    assert!(session.state().wallet_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_connect_loads_balance() {
    let (session, _provider) = connected_session().await;

    let state = session.state();
    assert!(state.wallet.is_connected);
    assert_eq!(state.wallet.address.as_deref(), Some(ADDRESS));
    assert_eq!(state.wallet.balance, 1.5432);

    let view = session.view();
    assert_eq!(view.balance.as_deref(), Some("1.5432 SOL"));
    assert_eq!(view.short_address.as_deref(), Some("9xQe...VFin"));
}

#[tokio::test(start_paused = true)]
async fn test_custom_balance_query() {
    let session = CalculatorSession::builder(Config::default())
        .provider(stub_provider())
        .balance_query(Arc::new(StubBalanceClient::new(42.0)))
        .build();

    session.connect().await.unwrap();
    assert_eq!(session.state().wallet.balance, 42.0);
    assert_eq!(session.refresh_balance(ADDRESS).await.unwrap(), 42.0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_reconnect_for_trusted_site() {
    let provider = Arc::new(StubWalletProvider::new(ADDRESS).trusted(true));
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .start()
        .await;

    let state = session.state();
    assert!(state.wallet.is_connected);
    assert_eq!(state.wallet.balance, 1.5432);
    assert_eq!(provider.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_silent_reconnect_skipped_for_untrusted_site() {
    let provider = stub_provider();
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .start()
        .await;

    let state = session.state();
    assert!(!state.wallet.is_connected);
    assert!(state.wallet_error.is_none());
    assert_eq!(provider.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_provider_events_are_applied() {
    let provider = stub_provider();
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .start()
        .await;
    session.set_operand(OperandSlot::First, "12");

    provider.emit(ProviderEvent::Connect {
        address: OTHER_ADDRESS.to_string(),
    });
    settle().await;

    let state = session.state();
    assert!(state.wallet.is_connected);
    assert_eq!(state.wallet.address.as_deref(), Some(OTHER_ADDRESS));
    assert_eq!(state.wallet.balance, 1.5432);

    provider.emit(ProviderEvent::Disconnect);
    settle().await;

    let state = session.state();
    assert!(!state.wallet.is_connected);
    assert!(state.wallet.address.is_none());
    // Only the wallet is reset by a provider-side disconnect
    assert_eq!(state.input.operand1, "12");
}

#[test]
fn test_account_switch_resets_balance() {
    let mut state = crate::SessionState::default();
    mark_connected(&mut state, ADDRESS.to_string());
    state.wallet.balance = 7.0;

    mark_connected(&mut state, ADDRESS.to_string());
    assert_eq!(state.wallet.balance, 7.0);

    mark_connected(&mut state, OTHER_ADDRESS.to_string());
    assert_eq!(state.wallet.address.as_deref(), Some(OTHER_ADDRESS));
    assert_eq!(state.wallet.balance, 0.0);
    assert!(state.wallet.is_connected);
}

#[tokio::test(start_paused = true)]
async fn test_copy_signature_and_explorer_url() {
    let clipboard = Arc::new(MemoryClipboard::default());
    let session = CalculatorSession::builder(Config::default())
        .provider(stub_provider())
        .clipboard(clipboard.clone())
        .build();
    session.connect().await.unwrap();

    assert!(session.explorer_url().is_none());
    session.copy_signature();
    assert!(clipboard.contents().is_none());

    fill(&session, "3", "3", Operation::Multiply);
    let receipt = session.submit().await.unwrap();

    session.copy_signature();
    assert_eq!(clipboard.contents().as_deref(), Some(receipt.signature.as_str()));
    assert_eq!(
        session.explorer_url(),
        Some(format!(
            "https://explorer.solana.com/tx/{}?cluster=devnet",
            receipt.signature
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_delay_and_signature_length() {
    let mut config = Config::for_network("testnet");
    config.submission.confirmation_delay_ms = 50;
    config.submission.signature_length = 64;

    let session = CalculatorSession::builder(config)
        .provider(stub_provider())
        .build();
    session.connect().await.unwrap();
    fill(&session, "1", "1", Operation::Add);

    let started = Instant::now();
    let receipt = session.submit().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(started.elapsed() < Duration::from_millis(2000));
    assert_eq!(receipt.signature.len(), 64);
    assert!(session
        .explorer_url()
        .is_some_and(|url| url.ends_with("?cluster=testnet")));
}

#[tokio::test(start_paused = true)]
async fn test_view_serializes() {
    let (session, _provider) = connected_session().await;
    fill(&session, "2", "2", Operation::Add);
    session.submit().await.unwrap();

    let json = serde_json::to_value(session.view()).unwrap();
    assert_eq!(json["status"], "Confirmed");
    assert_eq!(json["connected"], true);
    assert_eq!(json["result"], 4.0);
    assert_eq!(json["network"], "devnet");
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_dropped_submission_settles_as_failed() {
    let (session, _provider) = connected_session().await;
    fill(&session, "2", "3", Operation::Add);

    assert!(timeout(Duration::from_millis(10), session.submit()).await.is_err());

    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = session.state();
    assert_eq!(state.submission.phase, Phase::Failed);
    assert_eq!(
        state.submission.error_message.as_deref(),
        Some(SUBMISSION_INTERRUPTED_MESSAGE)
    );
    assert!(state.submission.signature.is_some());
    assert!(state.submission.result.is_none());
    assert!(logs_contain("Submission dropped before confirmation"));

    // The session accepts a new submission straight away
    let receipt = session.submit().await.unwrap();
    assert_eq!(receipt.result, 5.0);
    assert_eq!(session.state().submission.phase, Phase::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_submission_after_clear_writes_nothing() {
    let (session, _provider) = connected_session().await;
    fill(&session, "2", "3", Operation::Add);

    let mut submission = Box::pin(session.submit());
    assert!(timeout(Duration::from_millis(10), &mut submission).await.is_err());
    assert_eq!(session.state().submission.phase, Phase::Pending);

    session.clear();
    drop(submission);

    assert_eq!(session.state().submission, SubmissionState::default());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connect_releases_connecting_flag() {
    let provider = stub_provider();
    provider.set_connect_delay(Duration::from_millis(100));
    let session = CalculatorSession::builder(Config::default())
        .provider(provider.clone())
        .build();

    assert!(timeout(Duration::from_millis(10), session.connect()).await.is_err());
    assert!(!session.state().connecting);
    assert!(!session.view().connecting);
    assert!(!session.state().wallet.is_connected);

    let address = session.connect().await.unwrap();
    assert_eq!(address, ADDRESS);
    assert!(session.state().wallet.is_connected);
    assert_eq!(provider.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_second_connect_rejected_while_connecting() {
    let provider = stub_provider();
    provider.set_connect_delay(Duration::from_millis(100));
    let session = Arc::new(
        CalculatorSession::builder(Config::default())
            .provider(provider.clone())
            .build(),
    );

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.connect().await }
    });
    while !session.state().connecting {
        tokio::task::yield_now().await;
    }

    assert!(session.view().connecting);
    assert!(matches!(
        session.connect().await,
        Err(SessionError::ConnectInProgress)
    ));

    assert_eq!(task.await.unwrap().unwrap(), ADDRESS);
    assert!(!session.view().connecting);
    assert!(session.state().wallet.is_connected);
    assert_eq!(provider.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_denial_is_not_surfaced() {
    let clipboard = Arc::new(MemoryClipboard::default());
    clipboard.set_deny_writes(true);
    let session = CalculatorSession::builder(Config::default())
        .provider(stub_provider())
        .clipboard(clipboard.clone())
        .build();
    session.connect().await.unwrap();
    fill(&session, "3", "4", Operation::Add);
    session.submit().await.unwrap();

    session.copy_signature();
    assert!(clipboard.contents().is_none());

    let state = session.state();
    assert_eq!(state.submission.phase, Phase::Confirmed);
    assert!(state.submission.error_message.is_none());
    assert!(state.wallet_error.is_none());
}
