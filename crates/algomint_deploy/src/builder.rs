use crate::error::DeployError;
use crate::network::SuggestedParams;
use crate::plan::DeploymentPlan;
use crate::resolver::ForeignReferenceSet;
use algomint_transact::{
    Address, AlgoMintTransactError, AppCallTransactionBuilder, FeeParams, OnApplicationComplete,
    StateSchema, Transaction, TransactionHeader, TransactionHeaderBuilder, Validate,
    extra_pages_for,
};
use log::debug;

/// Inputs shared by both deployment transactions.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub sender: Address,
    pub approval_program: Vec<u8>,
    pub clear_state_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    /// Extra pages reported by network preparation; raised if the programs need more.
    pub extra_pages: u64,
    pub params: SuggestedParams,
}

/// Builds the create and follow-up call transactions. Makes no network calls.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    validity_window: Option<u64>,
}

impl TransactionBuilder {
    pub fn new(validity_window: Option<u64>) -> Self {
        Self { validity_window }
    }

    /// The app creation transaction. It carries the plan's arguments and foreign arrays only
    /// when the plan calls its method on create.
    ///
    /// The on-completion action is the plan's: the method's create action when it is called
    /// on create, otherwise the bare create action (`NoOp` when the interface declares none).
    /// The two-phase follow-up call is always `NoOp`.
    pub fn build_create(
        &self,
        context: &BuildContext,
        plan: &DeploymentPlan,
    ) -> Result<Transaction, DeployError> {
        let extra_pages = extra_pages_for(
            context.approval_program.len(),
            context.clear_state_program.len(),
        )?
        .max(context.extra_pages);

        let mut builder = AppCallTransactionBuilder::default();
        builder
            .header(self.header(context)?)
            .app_id(0)
            .on_complete(plan.on_complete)
            .approval_program(context.approval_program.clone())
            .clear_state_program(context.clear_state_program.clone())
            .global_state_schema(context.global_schema)
            .local_state_schema(context.local_schema)
            .extra_program_pages(extra_pages);

        if plan.calls_on_create() {
            with_arguments(&mut builder, &plan.args, &plan.references);
        }

        let transaction = builder.build().map_err(|e| DeployError::Build {
            message: e.to_string(),
        })?;
        debug!(
            "Built create transaction: on_complete={}, args={}, extra_pages={}",
            plan.on_complete.as_str(),
            transaction.app_call().args.as_ref().map_or(0, Vec::len),
            extra_pages
        );
        self.finalize(transaction, &context.params)
    }

    /// The second-phase `NoOp` call of the plan's method against the new app.
    pub fn build_post_create_call(
        &self,
        context: &BuildContext,
        plan: &DeploymentPlan,
        app_id: u64,
        dependency_ids: &[u64],
    ) -> Result<Transaction, DeployError> {
        if plan.method.is_none() {
            return Err(DeployError::validation(
                "A follow-up call needs a selected method",
            ));
        }
        if app_id == 0 {
            return Err(DeployError::validation(
                "A follow-up call needs the id of the created app",
            ));
        }

        let mut references = plan.references.clone();
        references.merge_dependencies(dependency_ids.iter().copied());
        references.check_limits().map_err(|message| DeployError::Build { message })?;

        let mut builder = AppCallTransactionBuilder::default();
        builder
            .header(self.header(context)?)
            .app_id(app_id)
            .on_complete(OnApplicationComplete::NoOp);
        with_arguments(&mut builder, &plan.args, &references);

        let transaction = builder.build().map_err(|e| DeployError::Build {
            message: e.to_string(),
        })?;
        debug!("Built follow-up call of app {}", app_id);
        self.finalize(transaction, &context.params)
    }

    fn header(&self, context: &BuildContext) -> Result<TransactionHeader, DeployError> {
        let params = &context.params;
        let last_valid = match self.validity_window {
            Some(window) => params.last_valid.min(params.first_valid + window),
            None => params.last_valid,
        };
        TransactionHeaderBuilder::default()
            .sender(context.sender)
            .first_valid(params.first_valid)
            .last_valid(last_valid)
            .genesis_hash(params.genesis_hash_bytes()?)
            .genesis_id(params.genesis_id.clone())
            .build()
            .map_err(|e| DeployError::Build {
                message: e.to_string(),
            })
    }

    /// Validates protocol limits, then sets the fee.
    fn finalize(
        &self,
        transaction: Transaction,
        params: &SuggestedParams,
    ) -> Result<Transaction, DeployError> {
        transaction
            .validate()
            .map_err(|errors| AlgoMintTransactError::InvalidTransaction { errors })?;

        if params.flat_fee {
            let mut transaction = transaction;
            transaction.header_mut().fee = Some(params.fee);
            return Ok(transaction);
        }
        Ok(transaction.assign_fee(FeeParams {
            fee_per_byte: params.fee,
            min_fee: params.min_fee,
            extra_fee: None,
            max_fee: None,
        })?)
    }
}

fn with_arguments(
    builder: &mut AppCallTransactionBuilder,
    args: &[Vec<u8>],
    references: &ForeignReferenceSet,
) {
    if !args.is_empty() {
        builder.args(args.to_vec());
    }
    if !references.apps().is_empty() {
        builder.app_references(references.apps().to_vec());
    }
    if !references.accounts().is_empty() {
        builder.account_references(references.accounts().to_vec());
    }
    if !references.assets().is_empty() {
        builder.asset_references(references.assets().to_vec());
    }
}
