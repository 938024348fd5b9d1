//! Turns raw create arguments into app arguments and the foreign arrays they index into.
//!
//! Reference arguments never travel as values: an `application`, `account` or `asset`
//! argument is appended to (or found in) the matching foreign array and encoded as a
//! `uint8` index. Apps and accounts are indexed from 1 because slot 0 is the called app
//! and the sender. Assets are indexed from 0.

use crate::error::DeployError;
use crate::ledger::DeploymentLedger;
use crate::network::AlgorandNetwork;
use crate::values::{parse_uint, parse_value};
use algomint_abi::{ABIMethod, ABIMethodArg, ABIMethodArgType, ABIReferenceType, ABIType, ABIValue};
use algomint_transact::{
    Address, MAX_ACCOUNT_REFERENCES, MAX_APP_ARGS, MAX_OVERALL_REFERENCES,
};
use log::debug;
use serde_json::Value;

/// Arguments beyond this many (after the selector) are packed into one trailing tuple.
const MAX_UNPACKED_ARGS: usize = MAX_APP_ARGS - 1;
const PACKED_PREFIX_ARGS: usize = MAX_APP_ARGS - 2;

/// The foreign apps, accounts and assets a transaction carries, deduplicated in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignReferenceSet {
    apps: Vec<u64>,
    accounts: Vec<Address>,
    assets: Vec<u64>,
}

impl ForeignReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apps(&self) -> &[u64] {
        &self.apps
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn assets(&self) -> &[u64] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.apps.len() + self.accounts.len() + self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based index of `app_id`; 0 refers to the called app itself.
    pub fn app_index(&mut self, app_id: u64) -> usize {
        if app_id == 0 {
            return 0;
        }
        1 + position_or_push(&mut self.apps, app_id)
    }

    /// 1-based index of `account`; the sender is always 0 and never stored.
    pub fn account_index(&mut self, account: Address, sender: &Address) -> usize {
        if account == *sender {
            return 0;
        }
        1 + position_or_push(&mut self.accounts, account)
    }

    pub fn asset_index(&mut self, asset_id: u64) -> usize {
        position_or_push(&mut self.assets, asset_id)
    }

    /// Appends dependency app ids that are not already referenced.
    pub fn merge_dependencies(&mut self, app_ids: impl IntoIterator<Item = u64>) {
        for app_id in app_ids {
            if app_id != 0 && !self.apps.contains(&app_id) {
                self.apps.push(app_id);
            }
        }
    }

    pub fn check_limits(&self) -> Result<(), String> {
        if self.accounts.len() > MAX_ACCOUNT_REFERENCES {
            return Err(format!(
                "{} foreign accounts exceed the limit of {}",
                self.accounts.len(),
                MAX_ACCOUNT_REFERENCES
            ));
        }
        if self.len() > MAX_OVERALL_REFERENCES {
            return Err(format!(
                "{} foreign references exceed the limit of {}",
                self.len(),
                MAX_OVERALL_REFERENCES
            ));
        }
        Ok(())
    }
}

fn position_or_push<T: PartialEq>(items: &mut Vec<T>, item: T) -> usize {
    match items.iter().position(|existing| *existing == item) {
        Some(index) => index,
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

/// A contract this deployment calls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDependency {
    pub name: String,
    /// Looked up in the ledger when absent.
    pub app_id: Option<u64>,
}

impl ContractDependency {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app_id: None,
        }
    }

    pub fn with_app_id(name: impl Into<String>, app_id: u64) -> Self {
        Self {
            name: name.into(),
            app_id: Some(app_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    pub app_id: u64,
}

/// Gives every dependency an app id, from the declaration or the ledger.
///
/// App id 0 is rejected: in the apps array it would stand for the app being created.
pub fn resolve_dependencies(
    dependencies: &[ContractDependency],
    ledger: &DeploymentLedger,
    network: AlgorandNetwork,
) -> Result<Vec<ResolvedDependency>, DeployError> {
    dependencies
        .iter()
        .map(|dependency| {
            let app_id = dependency
                .app_id
                .or_else(|| ledger.latest_app_id(&dependency.name, network))
                .ok_or_else(|| {
                    DeployError::validation(format!(
                        "Dependency '{}' has not been deployed on {}",
                        dependency.name, network
                    ))
                })?;
            if app_id == 0 {
                return Err(DeployError::validation(format!(
                    "Dependency '{}' has app id 0, which refers to the calling app",
                    dependency.name
                )));
            }
            Ok(ResolvedDependency {
                name: dependency.name.clone(),
                app_id,
            })
        })
        .collect()
}

/// Resolves create arguments against a ledger snapshot and the declared dependencies.
#[derive(Debug, Clone)]
pub struct ReferenceResolver<'a> {
    ledger: &'a DeploymentLedger,
    network: AlgorandNetwork,
    sender: Address,
    dependencies: &'a [ResolvedDependency],
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        ledger: &'a DeploymentLedger,
        network: AlgorandNetwork,
        sender: Address,
        dependencies: &'a [ResolvedDependency],
    ) -> Self {
        Self {
            ledger,
            network,
            sender,
            dependencies,
        }
    }

    /// Encodes `raw_args` for `method`, registering references in `references`.
    ///
    /// Returns the app arguments without the selector, in declared order. Dependency ids are
    /// merged into the apps array after all arguments. Missing trailing values are treated
    /// as absent, which only application references can recover from.
    pub fn resolve(
        &self,
        method: &ABIMethod,
        raw_args: &[Value],
        references: &mut ForeignReferenceSet,
    ) -> Result<Vec<Vec<u8>>, DeployError> {
        if raw_args.len() > method.args.len() {
            return Err(DeployError::argument(
                &method.name,
                format!(
                    "expects {} arguments, got {}",
                    method.args.len(),
                    raw_args.len()
                ),
            ));
        }

        let mut typed = Vec::with_capacity(method.args.len());
        for (position, arg) in method.args.iter().enumerate() {
            let raw = raw_args.get(position).unwrap_or(&Value::Null);
            let name = arg_name(arg, position);
            typed.push(self.resolve_argument(arg, &name, raw, references)?);
            references
                .check_limits()
                .map_err(|message| DeployError::argument(&name, message))?;
        }

        references.merge_dependencies(self.dependencies.iter().map(|d| d.app_id));
        references
            .check_limits()
            .map_err(|message| DeployError::argument("dependencies", message))?;

        debug!(
            "Resolved {} arguments of '{}': {} apps, {} accounts, {} assets",
            typed.len(),
            method.name,
            references.apps().len(),
            references.accounts().len(),
            references.assets().len()
        );
        encode_arguments(typed)
    }

    fn resolve_argument(
        &self,
        arg: &ABIMethodArg,
        name: &str,
        raw: &Value,
        references: &mut ForeignReferenceSet,
    ) -> Result<(ABIType, ABIValue), DeployError> {
        let index = match &arg.arg_type {
            ABIMethodArgType::Value(abi_type) => {
                let value = parse_value(abi_type, raw)
                    .map_err(|message| DeployError::argument(name, message))?;
                return Ok((abi_type.clone(), value));
            }
            ABIMethodArgType::Transaction(txn) => {
                return Err(DeployError::argument(
                    name,
                    format!("'{}' transaction arguments cannot be supplied at creation", txn),
                ));
            }
            ABIMethodArgType::Reference(ABIReferenceType::Application) => {
                references.app_index(self.application_id(name, raw)?)
            }
            ABIMethodArgType::Reference(ABIReferenceType::Account) => {
                let text = raw
                    .as_str()
                    .ok_or_else(|| DeployError::argument(name, "expected an account address"))?;
                let account = text
                    .trim()
                    .parse::<Address>()
                    .map_err(|e| DeployError::argument(name, e.to_string()))?;
                references.account_index(account, &self.sender)
            }
            ABIMethodArgType::Reference(ABIReferenceType::Asset) => {
                let asset_id = parse_uint(raw)
                    .and_then(|n| u64::try_from(&n).map_err(|_| format!("{} is not an asset id", n)))
                    .map_err(|message| DeployError::argument(name, message))?;
                references.asset_index(asset_id)
            }
        };
        Ok((ABIType::uint8(), ABIValue::from(index)))
    }

    /// An app id given directly, a contract name looked up in the ledger, or, when absent,
    /// the dependency whose name matches the argument name.
    fn application_id(&self, name: &str, raw: &Value) -> Result<u64, DeployError> {
        match raw {
            Value::Null => self.dependency_for(name).ok_or_else(|| {
                DeployError::argument(
                    name,
                    "no app id was supplied and no declared dependency matches",
                )
            }),
            Value::String(text) if !text.trim().chars().all(|c| c.is_ascii_digit()) => {
                let contract = text.trim();
                self.ledger
                    .latest_app_id(contract, self.network)
                    .or_else(|| {
                        self.dependencies
                            .iter()
                            .find(|d| d.name.eq_ignore_ascii_case(contract))
                            .map(|d| d.app_id)
                    })
                    .ok_or_else(|| {
                        DeployError::argument(
                            name,
                            format!("'{}' has not been deployed on {}", contract, self.network),
                        )
                    })
            }
            other => parse_uint(other)
                .and_then(|n| u64::try_from(&n).map_err(|_| format!("{} is not an app id", n)))
                .map_err(|message| DeployError::argument(name, message)),
        }
    }

    fn dependency_for(&self, arg_name: &str) -> Option<u64> {
        let wanted = normalize(arg_name);
        if wanted.is_empty() {
            return None;
        }
        self.dependencies
            .iter()
            .find(|d| {
                let declared = normalize(&d.name);
                !declared.is_empty() && (wanted.starts_with(&declared) || declared.starts_with(&wanted))
            })
            .map(|d| d.app_id)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn arg_name(arg: &ABIMethodArg, position: usize) -> String {
    arg.name
        .clone()
        .unwrap_or_else(|| format!("arg{}", position))
}

/// Encodes each argument, packing everything past the fourteenth into a tuple when the
/// method has more arguments than free app-argument slots.
fn encode_arguments(mut typed: Vec<(ABIType, ABIValue)>) -> Result<Vec<Vec<u8>>, DeployError> {
    if typed.len() > MAX_UNPACKED_ARGS {
        let packed = typed.split_off(PACKED_PREFIX_ARGS);
        let (types, values): (Vec<_>, Vec<_>) = packed.into_iter().unzip();
        typed.push((ABIType::Tuple(types), ABIValue::Array(values)));
    }
    typed
        .iter()
        .enumerate()
        .map(|(position, (abi_type, value))| {
            abi_type
                .encode(value)
                .map_err(|e| DeployError::argument(format!("arg{}", position), e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::record;
    use rstest::rstest;
    use serde_json::json;
    use std::str::FromStr;

    const SENDER: &str = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";

    fn sender() -> Address {
        SENDER.parse().unwrap()
    }

    fn method(signature: &str) -> ABIMethod {
        ABIMethod::from_str(signature).unwrap()
    }

    #[test]
    fn indexes_follow_their_conventions() {
        let mut refs = ForeignReferenceSet::new();
        assert_eq!(refs.app_index(55), 1);
        assert_eq!(refs.app_index(77), 2);
        assert_eq!(refs.app_index(55), 1);
        assert_eq!(refs.app_index(0), 0);
        assert_eq!(refs.asset_index(9), 0);
        assert_eq!(refs.asset_index(10), 1);
        assert_eq!(refs.account_index(sender(), &sender()), 0);
        assert_eq!(refs.account_index(Address::from_app_id(1), &sender()), 1);
        assert_eq!(refs.apps(), &[55, 77]);
        assert!(refs.accounts().len() == 1);
    }

    #[test]
    fn dependencies_only_extend_apps() {
        let mut refs = ForeignReferenceSet::new();
        refs.app_index(5);
        refs.merge_dependencies([5, 6, 0]);
        assert_eq!(refs.apps(), &[5, 6]);
        assert!(refs.assets().is_empty());
    }

    #[test]
    fn resolves_contract_name_from_ledger() {
        let mut ledger = DeploymentLedger::new();
        ledger.append(record("Vault", 55, AlgorandNetwork::TestNet));
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);

        let mut refs = ForeignReferenceSet::new();
        let args = resolver
            .resolve(&method("create(application)void"), &[json!("Vault")], &mut refs)
            .unwrap();

        assert_eq!(args, vec![vec![1u8]]);
        assert_eq!(refs.apps(), &[55]);
    }

    #[test]
    fn missing_app_argument_matches_dependency_by_name() {
        let ledger = DeploymentLedger::new();
        let deps = vec![ResolvedDependency {
            name: "Price_Oracle".to_string(),
            app_id: 900,
        }];
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &deps);

        let mut described = method("create(application)void");
        described.args[0].name = Some("priceOracleApp".to_string());
        let mut refs = ForeignReferenceSet::new();
        let args = resolver.resolve(&described, &[], &mut refs).unwrap();
        assert_eq!(args, vec![vec![1u8]]);
        assert_eq!(refs.apps(), &[900]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let ledger = DeploymentLedger::new();
        let deps = vec![ResolvedDependency {
            name: "Registry".to_string(),
            app_id: 12,
        }];
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &deps);
        let described = method("initialize(application,account,asset)void");
        let raw = [
            json!(1001),
            json!("WRBMNT66ECE2AOYKM76YVWIJMBW6Z3XCQZOKG5BL7NISAQC2LBGEKTZLRM"),
            json!("31566704"),
        ];

        let mut refs = ForeignReferenceSet::new();
        let first = resolver.resolve(&described, &raw, &mut refs).unwrap();
        let snapshot = refs.clone();
        let second = resolver.resolve(&described, &raw, &mut refs).unwrap();

        assert_eq!(first, vec![vec![1u8], vec![1u8], vec![0u8]]);
        assert_eq!(first, second);
        assert_eq!(refs, snapshot);
        assert_eq!(refs.apps(), &[1001, 12]);
    }

    #[test]
    fn sender_account_is_not_stored() {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let mut refs = ForeignReferenceSet::new();
        let args = resolver
            .resolve(&method("setOwner(account)void"), &[json!(SENDER)], &mut refs)
            .unwrap();
        assert_eq!(args, vec![vec![0u8]]);
        assert!(refs.is_empty());
    }

    #[test]
    fn value_arguments_keep_declared_order() {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let mut refs = ForeignReferenceSet::new();
        let args = resolver
            .resolve(&method("add(uint64,uint64)uint64"), &[json!(1), json!("2")], &mut refs)
            .unwrap();
        assert_eq!(args, vec![1u64.to_be_bytes().to_vec(), 2u64.to_be_bytes().to_vec()]);
    }

    #[rstest]
    #[case("create(application)void", vec![json!("Unknown")])]
    #[case("create(application)void", vec![])]
    #[case("mint(uint64)void", vec![json!("lots")])]
    #[case("mint(uint64)void", vec![json!(1), json!(2)])]
    #[case("fund(pay)void", vec![json!(1)])]
    #[case("grant(account)void", vec![json!(42)])]
    fn reports_encoding_errors(#[case] signature: &str, #[case] raw: Vec<Value>) {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let result = resolver.resolve(&method(signature), &raw, &mut ForeignReferenceSet::new());
        assert!(matches!(result, Err(DeployError::ArgumentEncoding { .. })));
    }

    #[test]
    fn too_many_accounts_is_an_encoding_error() {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let raw: Vec<Value> = (1..=5)
            .map(|id| json!(Address::from_app_id(id).to_string()))
            .collect();
        let result = resolver.resolve(
            &method("many(account,account,account,account,account)void"),
            &raw,
            &mut ForeignReferenceSet::new(),
        );
        match result {
            Err(DeployError::ArgumentEncoding { argument, .. }) => assert_eq!(argument, "arg4"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn packs_arguments_past_fourteen_into_a_tuple() {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let types = vec!["uint8"; 17].join(",");
        let raw: Vec<Value> = (0..17).map(|i| json!(i)).collect();

        let args = resolver
            .resolve(&method(&format!("wide({})void", types)), &raw, &mut ForeignReferenceSet::new())
            .unwrap();

        assert_eq!(args.len(), 15);
        assert_eq!(args[13], vec![13u8]);
        assert_eq!(args[14], vec![14u8, 15, 16]);
    }

    #[test]
    fn fifteen_arguments_fit_without_packing() {
        let ledger = DeploymentLedger::new();
        let resolver = ReferenceResolver::new(&ledger, AlgorandNetwork::TestNet, sender(), &[]);
        let types = vec!["uint8"; 15].join(",");
        let raw: Vec<Value> = (0..15).map(|i| json!(i)).collect();
        let args = resolver
            .resolve(&method(&format!("wide({})void", types)), &raw, &mut ForeignReferenceSet::new())
            .unwrap();
        assert_eq!(args.len(), 15);
        assert_eq!(args[14], vec![14u8]);
    }

    #[test]
    fn dependencies_resolve_from_declaration_or_ledger() {
        let mut ledger = DeploymentLedger::new();
        ledger.append(record("Registry", 55, AlgorandNetwork::TestNet));
        let resolved = resolve_dependencies(
            &[
                ContractDependency::named("Registry"),
                ContractDependency::with_app_id("Oracle", 900),
            ],
            &ledger,
            AlgorandNetwork::TestNet,
        )
        .unwrap();
        assert_eq!(
            resolved.iter().map(|d| d.app_id).collect::<Vec<_>>(),
            vec![55, 900]
        );
    }

    #[rstest]
    #[case(ContractDependency::with_app_id("Registry", 0))]
    #[case(ContractDependency::named("Registry"))]
    fn unusable_dependencies_are_rejected(#[case] dependency: ContractDependency) {
        let ledger = DeploymentLedger::new();
        let result = resolve_dependencies(&[dependency], &ledger, AlgorandNetwork::TestNet);
        match result {
            Err(DeployError::Validation { message }) => assert!(message.contains("Registry")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
