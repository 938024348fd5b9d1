mod common;

use std::sync::Arc;
use std::time::Duration;

use algomint_deploy::{
    AlgorandNetwork, ContractDependency, DeployConfig, DeployError, DeploymentEvent,
    DeploymentLedger, DeploymentOrchestrator, DeploymentRequest, DeploymentStage, PlanMode,
    SuggestedParams,
};
use algomint_transact::{Address, StateSchema, TransactionId};
use common::*;
use serde_json::{Value, json};

fn orchestrator(
    preparation: MockPreparation,
    signer: &Arc<ScriptedSigner>,
    submitter: &Arc<MockSubmitter>,
) -> DeploymentOrchestrator {
    orchestrator_with(&Arc::new(preparation), signer, submitter)
}

fn orchestrator_with(
    preparation: &Arc<MockPreparation>,
    signer: &Arc<ScriptedSigner>,
    submitter: &Arc<MockSubmitter>,
) -> DeploymentOrchestrator {
    DeploymentOrchestrator::new(
        DeployConfig::new(AlgorandNetwork::TestNet),
        preparation.clone(),
        signer.clone(),
        submitter.clone(),
    )
    .expect("config should be valid")
}

fn token_request() -> DeploymentRequest {
    DeploymentRequest {
        sender: SENDER.parse().unwrap(),
        approval_source: "#pragma version 10".to_string(),
        clear_source: "#pragma version 10".to_string(),
        interface: token_interface(),
        create_args: vec![json!("ALGO"), json!(1_000_000)],
        dependencies: Vec::new(),
    }
}

fn vault_request(dependencies: Vec<ContractDependency>, create_args: Vec<Value>) -> DeploymentRequest {
    DeploymentRequest {
        sender: SENDER.parse().unwrap(),
        approval_source: "#pragma version 10".to_string(),
        clear_source: "#pragma version 10".to_string(),
        interface: vault_interface(),
        create_args,
        dependencies,
    }
}

#[tokio::test]
async fn test_single_phase_create_records_deployment() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt(
        "CREATETX",
        1001,
        vec![uint64_return_log(1_000_000)],
    )]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let outcome = orchestrator
        .deploy(token_request())
        .await
        .expect("deployment should succeed");
    let result = outcome.deployed().expect("should be deployed");

    assert_eq!(result.plan.mode, PlanMode::SinglePhase);
    assert_eq!(result.record.contract_name, "Token");
    assert_eq!(result.record.app_id, 1001);
    assert_eq!(
        result.record.app_address,
        Address::from_app_id(1001).to_string()
    );
    assert_eq!(
        result.record.explorer_url,
        "https://testnet.explorer.perawallet.app/tx/CREATETX"
    );
    assert_eq!(result.record.abi_return, Some(json!(1_000_000)));
    assert_eq!(result.record.second_phase_transaction_id, None);
    assert_eq!(orchestrator.stage(), DeploymentStage::Confirmed);
    assert_eq!(orchestrator.ledger().len(), 1);

    let signed = signer.signed();
    assert_eq!(signed.len(), 1, "single phase signs once");
    let create = signed[0].app_call();
    assert_eq!(create.app_id, 0);
    assert_eq!(create.args.as_ref().map(Vec::len), Some(3));
    assert_eq!(
        create.args.as_ref().unwrap()[0],
        result.plan.args[0],
        "selector should lead the arguments"
    );
    assert_eq!(create.global_state_schema.map(|s| s.num_uints), Some(1));
}

#[tokio::test]
async fn test_networks_are_recorded_on_the_returned_interface_only() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let outcome = orchestrator.deploy(token_request()).await.unwrap();
    let result = outcome.deployed().unwrap();

    assert_eq!(result.interface.app_id_for(TESTNET_GENESIS_HASH), Some(1001));
    assert_eq!(
        result.interface.to_json()["networks"][TESTNET_GENESIS_HASH]["appID"],
        json!(1001)
    );
    assert!(result.record.interface_spec.get("networks").is_none());
    assert_eq!(result.record.abi_return, None);
}

#[tokio::test]
async fn test_two_phase_create_calls_setup_against_new_app() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![
        receipt("CREATETX", 1001, vec![]),
        receipt("SETUPTX", 0, vec![]),
    ]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let outcome = orchestrator
        .deploy(vault_request(
            vec![ContractDependency::with_app_id("Registry", 55)],
            vec![],
        ))
        .await
        .expect("deployment should succeed");
    let result = outcome.deployed().unwrap();

    assert_eq!(result.plan.mode, PlanMode::TwoPhase);
    assert_eq!(result.record.app_id, 1001);
    assert_eq!(result.record.transaction_id, "CREATETX");
    assert_eq!(
        result.record.second_phase_transaction_id.as_deref(),
        Some("SETUPTX")
    );

    let signed = signer.signed();
    assert_eq!(signed.len(), 2);
    let create = signed[0].app_call();
    assert!(create.args.is_none(), "the create is bare");
    assert!(create.app_references.is_none());

    let setup = signed[1].app_call();
    assert_eq!(setup.app_id, 1001);
    assert!(setup.approval_program.is_none());
    assert_eq!(setup.app_references, Some(vec![55]));
    assert_eq!(setup.args.as_ref().unwrap()[1], vec![1]);
    assert_eq!(submitter.submitted(), 2);
}

#[tokio::test]
async fn test_application_argument_resolves_from_ledger() {
    init_test_logging();

    // Registry create, vault create, vault setup
    let signer = Arc::new(ScriptedSigner::new(vec![Ok(()); 3]));
    let submitter = Arc::new(MockSubmitter::new(vec![
        receipt("REGISTRYTX", 55, vec![]),
        receipt("CREATETX", 1001, vec![]),
        receipt("SETUPTX", 0, vec![]),
    ]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let mut registry = token_request();
    registry.interface.name = "Registry".to_string();
    orchestrator.deploy(registry).await.unwrap();

    let outcome = orchestrator
        .deploy(vault_request(vec![], vec![json!("registry")]))
        .await
        .unwrap();
    let result = outcome.deployed().unwrap();

    assert_eq!(result.plan.references.apps(), &[55]);
    assert_eq!(result.plan.args[1], vec![1]);
    assert_eq!(signer.signed().len(), 3);
    assert_eq!(signer.signed()[2].app_call().app_references, Some(vec![55]));
    assert_eq!(
        result.record.second_phase_transaction_id.as_deref(),
        Some("SETUPTX")
    );
    assert_eq!(orchestrator.ledger().len(), 2);
    assert_eq!(
        orchestrator
            .ledger()
            .latest_app_id("Vault", AlgorandNetwork::TestNet),
        Some(1001)
    );
}

#[tokio::test]
async fn test_cancel_at_first_signature_returns_to_idle() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::new(vec![Err(
        "User rejected the request".to_string(),
    )]));
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let outcome = orchestrator.deploy(token_request()).await.unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(orchestrator.stage(), DeploymentStage::Idle);
    assert!(orchestrator.ledger().is_empty());
    assert_eq!(submitter.submitted(), 0);
}

#[tokio::test]
async fn test_signer_failure_is_not_a_cancellation() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::new(vec![Err(
        "device not connected".to_string(),
    )]));
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert!(matches!(error, DeployError::Signing { .. }));
    assert_eq!(error.stage(), Some(DeploymentStage::AwaitingSignature));
    assert_eq!(orchestrator.stage(), DeploymentStage::Failed);
}

#[tokio::test]
async fn test_dropped_wallet_connection_is_a_signing_failure() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::new(vec![Err(
        "WebSocket connection closed unexpectedly".to_string(),
    )]));
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert!(matches!(error, DeployError::Signing { .. }));
    assert!(error.to_string().contains("WebSocket connection closed"));
    assert_eq!(orchestrator.stage(), DeploymentStage::Failed);
    assert_eq!(submitter.submitted(), 0);
}

#[tokio::test]
async fn test_cancel_at_second_signature_reports_live_app() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::new(vec![
        Ok(()),
        Err("Wallet closed by user".to_string()),
    ]));
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator
        .deploy(vault_request(vec![], vec![json!(55)]))
        .await
        .unwrap_err();

    assert!(matches!(error, DeployError::PartialDeployment { .. }));
    assert_eq!(error.live_app_id(), Some(1001));
    assert_eq!(error.stage(), Some(DeploymentStage::AwaitingSecondSignature));
    assert_eq!(orchestrator.stage(), DeploymentStage::Idle);
    assert!(orchestrator.ledger().is_empty());
}

#[tokio::test]
async fn test_second_submission_failure_is_partial() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator
        .deploy(vault_request(vec![], vec![json!(55)]))
        .await
        .unwrap_err();

    assert_eq!(error.live_app_id(), Some(1001));
    assert_eq!(error.stage(), Some(DeploymentStage::SubmittingSecond));
    let setup_id = signer.signed()[1].id().unwrap();
    assert_eq!(error.transaction_id(), Some(setup_id.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_submission_times_out() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(
        MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])])
            .with_delay(Duration::from_secs(60)),
    );
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert!(matches!(error, DeployError::Submission { .. }));
    assert!(error.to_string().contains("Timed out"));
    assert!(error.to_string().contains("may still confirm"));
    let create_id = signer.signed()[0].id().unwrap();
    assert_eq!(error.transaction_id(), Some(create_id.as_str()));
    assert_eq!(error.stage(), Some(DeploymentStage::Submitting));
    assert_eq!(orchestrator.stage(), DeploymentStage::Failed);
    assert_eq!(submitter.submitted(), 0);
}

#[tokio::test]
async fn test_create_without_app_id_fails() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 0, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert!(matches!(error, DeployError::Submission { .. }));
    assert_eq!(error.transaction_id(), Some("CREATETX"));
    assert!(orchestrator.ledger().is_empty());
}

#[tokio::test]
async fn test_dependency_with_app_id_zero_is_rejected() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let error = orchestrator
        .deploy(vault_request(
            vec![ContractDependency::with_app_id("Registry", 0)],
            vec![],
        ))
        .await
        .unwrap_err();

    assert!(error.to_string().contains("app id 0"));
    assert_eq!(error.stage(), Some(DeploymentStage::Building));
    assert_eq!(orchestrator.stage(), DeploymentStage::Failed);
    assert!(signer.signed().is_empty());
}

#[tokio::test]
async fn test_preparation_receives_declared_schema() {
    init_test_logging();

    let preparation = Arc::new(MockPreparation::default());
    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator_with(&preparation, &signer, &submitter);

    orchestrator.deploy(token_request()).await.unwrap();

    let requests = preparation.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].global_schema,
        StateSchema {
            num_uints: 1,
            num_byte_slices: 1,
        }
    );
    assert_eq!(requests[0].local_schema, StateSchema::default());
    assert_eq!(requests[0].network, AlgorandNetwork::TestNet);
}

#[tokio::test]
async fn test_preparation_failure_fails_before_signing() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let preparation = MockPreparation {
        failure: Some("teal compile failed".to_string()),
        ..Default::default()
    };
    let mut orchestrator = orchestrator(preparation, &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert!(matches!(error, DeployError::Preparation { .. }));
    assert_eq!(error.stage(), Some(DeploymentStage::Preparing));
    assert!(signer.signed().is_empty());
}

#[tokio::test]
async fn test_params_for_another_network_are_rejected() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![]));
    let preparation = MockPreparation {
        params: Some(SuggestedParams {
            genesis_id: "mainnet-v1.0".to_string(),
            ..testnet_params()
        }),
        ..Default::default()
    };
    let mut orchestrator = orchestrator(preparation, &signer, &submitter);

    let error = orchestrator.deploy(token_request()).await.unwrap_err();

    assert_eq!(error.stage(), Some(DeploymentStage::Preparing));
    assert!(error.to_string().contains("mainnet-v1.0"));
}

#[tokio::test]
async fn test_bad_argument_degrades_to_bare_create() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);

    let outcome = orchestrator
        .deploy(vault_request(vec![], vec![json!("NotDeployed")]))
        .await
        .unwrap();
    let result = outcome.deployed().unwrap();

    assert!(result.plan.degraded);
    assert_eq!(result.plan.mode, PlanMode::Bare);
    assert_eq!(signer.signed().len(), 1);
    assert!(signer.signed()[0].app_call().args.is_none());
}

#[tokio::test]
async fn test_events_follow_the_stages() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::approving());
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter);
    let mut events = orchestrator.subscribe();

    orchestrator.deploy(token_request()).await.unwrap();

    let mut stages = Vec::new();
    let mut confirmed = None;
    while let Ok(event) = events.try_recv() {
        match event {
            DeploymentEvent::StageChanged { to, .. } => stages.push(to),
            DeploymentEvent::Confirmed { app_id, .. } => confirmed = Some(app_id),
            DeploymentEvent::Warning { .. } => {}
        }
    }

    assert_eq!(
        stages,
        vec![
            DeploymentStage::Preparing,
            DeploymentStage::Building,
            DeploymentStage::AwaitingSignature,
            DeploymentStage::Submitting,
            DeploymentStage::Confirmed,
        ]
    );
    assert_eq!(confirmed, Some(1001));
}

#[tokio::test]
async fn test_failed_orchestrator_can_deploy_again() {
    init_test_logging();

    let signer = Arc::new(ScriptedSigner::new(vec![
        Err("hardware fault".to_string()),
        Ok(()),
    ]));
    let submitter = Arc::new(MockSubmitter::new(vec![receipt("CREATETX", 1001, vec![])]));
    let mut orchestrator = orchestrator(MockPreparation::default(), &signer, &submitter)
        .with_ledger(DeploymentLedger::new());

    assert!(orchestrator.deploy(token_request()).await.is_err());
    assert_eq!(orchestrator.stage(), DeploymentStage::Failed);

    let outcome = orchestrator.deploy(token_request()).await.unwrap();
    assert!(outcome.deployed().is_some());
    assert_eq!(orchestrator.stage(), DeploymentStage::Confirmed);
}
