use std::sync::Arc;

use log::debug;
use proxies_core::{
    derive_direct_proxy_address, derive_holder_address, derive_indirect_proxy_address,
    many_to_one_salt, one_to_one_salt, Address, ImplementationId, Salt,
};
use proxies_ledger::{CallContext, Program, Revert, StorageMap, StorageValue};
use serde::{Deserialize, Serialize};

use crate::abi::{decode, encode, HolderCall, ManagerCall, ProxyAdminCall};
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::holder::ImplementationHolder;
use crate::proxy::{DirectProxy, IndirectProxy};

pub const DEPLOYMENT_MANAGER_IMAGE: &[u8] = b"proxies/deployment-manager/1";

/// A many-to-one relationship: every indirect proxy under `implementation_id`
/// resolves through `holder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub implementation_id: ImplementationId,
    pub implementation: Address,
    pub holder: Address,
    pub locked: bool,
}

/// Registry of proxy deployments and implementation relationships.
///
/// The account that deploys the manager becomes its owner. The owner, and any
/// approved deployer, may deploy proxies; everything else is owner only. Proxies and
/// holders are deployed by the manager itself, with the requesting account mixed into
/// the salt, so their addresses can be computed up front with the `derivation`
/// functions.
pub struct DeploymentManager;

impl DeploymentManager {
    fn owner() -> StorageValue<Address> {
        StorageValue::new("proxies.manager.owner")
    }

    fn approved_deployers() -> StorageMap<Address, bool> {
        StorageMap::new("proxies.manager.approved_deployers")
    }

    fn relationships() -> StorageMap<ImplementationId, Relationship> {
        StorageMap::new("proxies.manager.relationships")
    }

    fn direct_proxies() -> StorageMap<Address, bool> {
        StorageMap::new("proxies.manager.direct_proxies")
    }

    fn current_owner(ctx: &CallContext<'_>) -> Result<Address, Revert> {
        Ok(Self::owner().get(ctx)?.unwrap_or(Address::ZERO))
    }

    fn only_owner(ctx: &CallContext<'_>) -> Result<(), Revert> {
        if ctx.caller() != Self::current_owner(ctx)? {
            return Err(RegistryError::NotOwner.into());
        }
        Ok(())
    }

    fn only_owner_or_approved_deployer(ctx: &CallContext<'_>) -> Result<(), Revert> {
        let caller = ctx.caller();
        if caller == Self::current_owner(ctx)? || Self::is_approved(ctx, &caller)? {
            return Ok(());
        }
        Err(RegistryError::NotApprovedDeployer.into())
    }

    fn is_approved(ctx: &CallContext<'_>, account: &Address) -> Result<bool, Revert> {
        Ok(Self::approved_deployers().get(ctx, account)?.unwrap_or(false))
    }

    fn require_code(ctx: &CallContext<'_>, implementation: &Address) -> Result<(), Revert> {
        if !ctx.has_code(implementation) {
            return Err(RegistryError::InvalidImplementation(*implementation).into());
        }
        Ok(())
    }

    fn require_direct_proxy(ctx: &CallContext<'_>, proxy: &Address) -> Result<(), Revert> {
        if !Self::direct_proxies().get(ctx, proxy)?.unwrap_or(false) {
            return Err(RegistryError::ProxyNotFound(*proxy).into());
        }
        Ok(())
    }

    /// A locked proxy rejects every update, whatever the new implementation
    fn require_unlocked_direct_proxy(
        ctx: &mut CallContext<'_>,
        proxy: Address,
    ) -> Result<(), Revert> {
        let output = ctx.static_call(proxy, &encode(&ProxyAdminCall::IsLocked)?)?;
        let locked: bool = decode(&output)?;
        if locked {
            return Err(RegistryError::AlreadyLocked.into());
        }
        Ok(())
    }

    fn require_relationship(
        ctx: &CallContext<'_>,
        implementation_id: &ImplementationId,
    ) -> Result<Relationship, Revert> {
        Self::relationships()
            .get(ctx, implementation_id)?
            .ok_or_else(|| RegistryError::RelationshipNotFound(*implementation_id).into())
    }

    fn deploy_direct_proxy(
        ctx: &mut CallContext<'_>,
        salt: Salt,
        implementation: Address,
    ) -> Result<Address, Revert> {
        Self::only_owner_or_approved_deployer(ctx)?;
        Self::require_code(ctx, &implementation)?;

        let origin = ctx.caller();
        let expected = derive_direct_proxy_address(&ctx.this(), &origin, &salt);
        if ctx.has_code(&expected) {
            return Err(RegistryError::DuplicateDeployment(expected).into());
        }

        let proxy = ctx.deploy(
            &one_to_one_salt(&origin, &salt),
            Arc::new(DirectProxy),
            &encode(&implementation)?,
        )?;
        Self::direct_proxies().set(ctx, &proxy, &true)?;

        debug!(
            "Deployed direct proxy {} for {} with implementation {}",
            proxy, origin, implementation
        );
        RegistryEvent::DirectProxyDeployed {
            proxy,
            origin,
            salt,
            implementation,
        }
        .publish(ctx)?;
        Ok(proxy)
    }

    fn set_direct_implementation(
        ctx: &mut CallContext<'_>,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        Self::require_direct_proxy(ctx, &proxy)?;
        Self::require_unlocked_direct_proxy(ctx, proxy)?;
        Self::require_code(ctx, &implementation)?;

        ctx.call(proxy, &encode(&ProxyAdminCall::SetImplementation(implementation))?)?;

        debug!("Direct proxy {} now points at {}", proxy, implementation);
        RegistryEvent::DirectImplementationSet {
            proxy,
            implementation,
        }
        .publish(ctx)
    }

    fn lock_direct_proxy(ctx: &mut CallContext<'_>, proxy: Address) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        Self::require_direct_proxy(ctx, &proxy)?;
        ctx.call(proxy, &encode(&ProxyAdminCall::Lock)?)?;

        debug!("Locked direct proxy {}", proxy);
        RegistryEvent::DirectProxyLocked { proxy }.publish(ctx)
    }

    fn create_indirect_relationship(
        ctx: &mut CallContext<'_>,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        if Self::relationships().contains(ctx, &implementation_id)? {
            return Err(RegistryError::RelationshipExists(implementation_id).into());
        }
        Self::require_code(ctx, &implementation)?;

        let expected = derive_holder_address(&ctx.this(), &implementation_id);
        if ctx.has_code(&expected) {
            return Err(RegistryError::DuplicateDeployment(expected).into());
        }
        let holder = ctx.deploy(
            &Salt::from(implementation_id),
            Arc::new(ImplementationHolder),
            &encode(&implementation)?,
        )?;

        let relationship = Relationship {
            implementation_id,
            implementation,
            holder,
            locked: false,
        };
        Self::relationships().set(ctx, &implementation_id, &relationship)?;

        debug!("Created relationship {} with holder {}", implementation_id, holder);
        RegistryEvent::RelationshipCreated {
            implementation_id,
            implementation,
            holder,
        }
        .publish(ctx)
    }

    fn deploy_indirect_proxy(
        ctx: &mut CallContext<'_>,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    ) -> Result<Address, Revert> {
        Self::only_owner_or_approved_deployer(ctx)?;
        let relationship = Self::require_relationship(ctx, &implementation_id)?;

        let origin = ctx.caller();
        let expected =
            derive_indirect_proxy_address(&ctx.this(), &origin, &implementation_id, &proxy_id);
        if ctx.has_code(&expected) {
            return Err(RegistryError::DuplicateDeployment(expected).into());
        }

        let proxy = ctx.deploy(
            &many_to_one_salt(&origin, &implementation_id, &proxy_id),
            Arc::new(IndirectProxy),
            &encode(&relationship.holder)?,
        )?;

        debug!("Deployed indirect proxy {} under {} for {}", proxy, implementation_id, origin);
        RegistryEvent::IndirectProxyDeployed {
            proxy,
            origin,
            implementation_id,
            proxy_id,
            holder: relationship.holder,
        }
        .publish(ctx)?;
        Ok(proxy)
    }

    fn set_indirect_implementation(
        ctx: &mut CallContext<'_>,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        let mut relationship = Self::require_relationship(ctx, &implementation_id)?;
        if relationship.locked {
            return Err(RegistryError::AlreadyLocked.into());
        }
        Self::require_code(ctx, &implementation)?;

        ctx.call(
            relationship.holder,
            &encode(&HolderCall::SetImplementation(implementation))?,
        )?;
        relationship.implementation = implementation;
        Self::relationships().set(ctx, &implementation_id, &relationship)?;

        debug!("Relationship {} now points at {}", implementation_id, implementation);
        RegistryEvent::IndirectImplementationSet {
            implementation_id,
            implementation,
        }
        .publish(ctx)
    }

    fn lock_indirect_relationship(
        ctx: &mut CallContext<'_>,
        implementation_id: ImplementationId,
    ) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        let mut relationship = Self::require_relationship(ctx, &implementation_id)?;
        if relationship.locked {
            return Err(RegistryError::AlreadyLocked.into());
        }
        relationship.locked = true;
        Self::relationships().set(ctx, &implementation_id, &relationship)?;

        debug!("Locked relationship {}", implementation_id);
        RegistryEvent::RelationshipLocked { implementation_id }.publish(ctx)
    }

    fn set_deployer_approval(
        ctx: &mut CallContext<'_>,
        deployer: Address,
        approved: bool,
    ) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        if approved {
            Self::approved_deployers().set(ctx, &deployer, &true)?;
        } else {
            Self::approved_deployers().remove(ctx, &deployer)?;
        }

        debug!("Deployer {} approval set to {}", deployer, approved);
        RegistryEvent::DeployerApprovalChanged { deployer, approved }.publish(ctx)
    }

    fn transfer_ownership(ctx: &mut CallContext<'_>, new_owner: Address) -> Result<(), Revert> {
        Self::only_owner(ctx)?;
        let previous_owner = Self::current_owner(ctx)?;
        Self::owner().set(ctx, &new_owner)?;

        debug!("Manager ownership moved from {} to {}", previous_owner, new_owner);
        RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        }
        .publish(ctx)
    }

    fn dispatch(ctx: &mut CallContext<'_>, call: ManagerCall) -> Result<Vec<u8>, Revert> {
        let output = match call {
            ManagerCall::DeployDirectProxy {
                salt,
                implementation,
            } => encode(&Self::deploy_direct_proxy(ctx, salt, implementation)?)?,
            ManagerCall::SetDirectImplementation {
                proxy,
                implementation,
            } => encode(&Self::set_direct_implementation(ctx, proxy, implementation)?)?,
            ManagerCall::LockDirectProxy { proxy } => {
                encode(&Self::lock_direct_proxy(ctx, proxy)?)?
            }
            ManagerCall::CreateIndirectRelationship {
                implementation_id,
                implementation,
            } => encode(&Self::create_indirect_relationship(
                ctx,
                implementation_id,
                implementation,
            )?)?,
            ManagerCall::DeployIndirectProxy {
                implementation_id,
                proxy_id,
            } => encode(&Self::deploy_indirect_proxy(ctx, implementation_id, proxy_id)?)?,
            ManagerCall::SetIndirectImplementation {
                implementation_id,
                implementation,
            } => encode(&Self::set_indirect_implementation(
                ctx,
                implementation_id,
                implementation,
            )?)?,
            ManagerCall::LockIndirectRelationship { implementation_id } => {
                encode(&Self::lock_indirect_relationship(ctx, implementation_id)?)?
            }
            ManagerCall::ApproveDeployer { deployer } => {
                encode(&Self::set_deployer_approval(ctx, deployer, true)?)?
            }
            ManagerCall::RevokeDeployerApproval { deployer } => {
                encode(&Self::set_deployer_approval(ctx, deployer, false)?)?
            }
            ManagerCall::TransferOwnership { new_owner } => {
                encode(&Self::transfer_ownership(ctx, new_owner)?)?
            }

            ManagerCall::Owner => encode(&Self::current_owner(ctx)?)?,
            ManagerCall::IsApprovedDeployer { account } => {
                encode(&Self::is_approved(ctx, &account)?)?
            }
            ManagerCall::ComputeDirectProxyAddress { deployer, salt } => {
                encode(&derive_direct_proxy_address(&ctx.this(), &deployer, &salt))?
            }
            ManagerCall::ComputeIndirectProxyAddress {
                deployer,
                implementation_id,
                proxy_id,
            } => encode(&derive_indirect_proxy_address(
                &ctx.this(),
                &deployer,
                &implementation_id,
                &proxy_id,
            ))?,
            ManagerCall::ComputeHolderAddress { implementation_id } => {
                encode(&derive_holder_address(&ctx.this(), &implementation_id))?
            }
            ManagerCall::Relationship { implementation_id } => {
                encode(&Self::relationships().get(ctx, &implementation_id)?)?
            }
            ManagerCall::ImplementationHolder { implementation_id } => {
                encode(&Self::require_relationship(ctx, &implementation_id)?.holder)?
            }
            ManagerCall::IsRelationshipLocked { implementation_id } => {
                encode(&Self::require_relationship(ctx, &implementation_id)?.locked)?
            }
            ManagerCall::DirectImplementation { proxy } => {
                Self::require_direct_proxy(ctx, &proxy)?;
                ctx.call(proxy, &encode(&ProxyAdminCall::Implementation)?)?
            }
            ManagerCall::IsDirectProxyLocked { proxy } => {
                Self::require_direct_proxy(ctx, &proxy)?;
                ctx.call(proxy, &encode(&ProxyAdminCall::IsLocked)?)?
            }
        };
        Ok(output)
    }
}

impl Program for DeploymentManager {
    fn name(&self) -> &str {
        "deployment-manager"
    }

    fn image(&self) -> &[u8] {
        DEPLOYMENT_MANAGER_IMAGE
    }

    fn construct(&self, ctx: &mut CallContext<'_>, _args: &[u8]) -> Result<(), Revert> {
        let owner = ctx.caller();
        Self::owner().set(ctx, &owner)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let call: ManagerCall = decode(input)?;
        Self::dispatch(ctx, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ManagerClient;
    use crate::error::{ClientError, ErrorKind};
    use crate::events::decode_events;
    use crate::testing::{deploy_logic, Counter};
    use proxies_ledger::Ledger;

    struct Setup {
        ledger: Ledger,
        manager: ManagerClient,
        owner: Address,
        logic_v1: Address,
        logic_v2: Address,
    }

    fn setup() -> Setup {
        let mut ledger = Ledger::in_memory();
        let owner = Address::from_label("owner");
        let manager = ledger
            .deploy(owner, Arc::new(DeploymentManager), &[])
            .unwrap()
            .contract_address
            .unwrap();
        let logic_v1 = deploy_logic(&mut ledger, owner, Counter::v1());
        let logic_v2 = deploy_logic(&mut ledger, owner, Counter::v2());
        Setup {
            ledger,
            manager: ManagerClient::new(manager),
            owner,
            logic_v1,
            logic_v2,
        }
    }

    fn registry_error(result: Result<impl std::fmt::Debug, ClientError>) -> RegistryError {
        match result {
            Err(ClientError::Registry(err)) => err,
            other => panic!("expected a registry error, got {:?}", other),
        }
    }

    #[test]
    fn test_deployer_owns_new_manager() {
        let mut s = setup();
        assert_eq!(s.manager.owner(&mut s.ledger).unwrap(), s.owner);
    }

    #[test]
    fn test_direct_proxy_lands_at_computed_address() {
        let mut s = setup();
        let salt = Salt::from_label("direct");

        let computed = s
            .manager
            .compute_direct_proxy_address(&mut s.ledger, s.owner, salt)
            .unwrap();
        assert_eq!(
            computed,
            derive_direct_proxy_address(&s.manager.address(), &s.owner, &salt)
        );
        assert!(!s.ledger.has_code(&computed));

        let deployment = s
            .manager
            .deploy_direct_proxy(&mut s.ledger, s.owner, salt, s.logic_v1)
            .unwrap();
        assert_eq!(deployment.address, computed);
        assert_eq!(
            decode_events(&deployment.receipt, &[s.manager.address()]),
            vec![(
                s.manager.address(),
                RegistryEvent::DirectProxyDeployed {
                    proxy: computed,
                    origin: s.owner,
                    salt,
                    implementation: s.logic_v1,
                }
            )]
        );
        assert_eq!(
            s.manager
                .direct_implementation(&mut s.ledger, computed)
                .unwrap(),
            s.logic_v1
        );
    }

    #[test]
    fn test_duplicate_direct_deployment_is_rejected() {
        let mut s = setup();
        let salt = Salt::from_label("direct");
        let first = s
            .manager
            .deploy_direct_proxy(&mut s.ledger, s.owner, salt, s.logic_v1)
            .unwrap()
            .address;
        let receipts = s.ledger.receipts().len();

        let err = registry_error(s.manager.deploy_direct_proxy(
            &mut s.ledger,
            s.owner,
            salt,
            s.logic_v2,
        ));
        assert_eq!(err, RegistryError::DuplicateDeployment(first));
        assert_eq!(err.kind(), ErrorKind::DuplicateDeployment);
        assert_eq!(s.ledger.receipts().len(), receipts);
        assert_eq!(
            s.manager.direct_implementation(&mut s.ledger, first).unwrap(),
            s.logic_v1
        );
    }

    #[test]
    fn test_implementation_without_code_is_rejected() {
        let mut s = setup();
        let nowhere = Address::from_label("nowhere");

        let err = registry_error(s.manager.deploy_direct_proxy(
            &mut s.ledger,
            s.owner,
            Salt::from_label("direct"),
            nowhere,
        ));
        assert_eq!(err, RegistryError::InvalidImplementation(nowhere));

        let err = registry_error(s.manager.create_indirect_relationship(
            &mut s.ledger,
            s.owner,
            ImplementationId::from_label("logic"),
            nowhere,
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidImplementation);
    }

    #[test]
    fn test_locked_direct_proxy_rejects_updates() {
        let mut s = setup();
        let proxy = s
            .manager
            .deploy_direct_proxy(&mut s.ledger, s.owner, Salt::from_label("direct"), s.logic_v1)
            .unwrap()
            .address;

        s.manager
            .set_direct_implementation(&mut s.ledger, s.owner, proxy, s.logic_v2)
            .unwrap();
        s.manager
            .lock_direct_proxy(&mut s.ledger, s.owner, proxy)
            .unwrap();
        assert!(s.manager.is_direct_proxy_locked(&mut s.ledger, proxy).unwrap());

        let err = registry_error(s.manager.set_direct_implementation(
            &mut s.ledger,
            s.owner,
            proxy,
            s.logic_v1,
        ));
        assert_eq!(err, RegistryError::AlreadyLocked);
        let err = registry_error(s.manager.lock_direct_proxy(&mut s.ledger, s.owner, proxy));
        assert_eq!(err, RegistryError::AlreadyLocked);
        assert_eq!(
            s.manager.direct_implementation(&mut s.ledger, proxy).unwrap(),
            s.logic_v2
        );
    }

    #[test]
    fn test_locked_direct_proxy_reports_lock_before_implementation() {
        let mut s = setup();
        let proxy = s
            .manager
            .deploy_direct_proxy(&mut s.ledger, s.owner, Salt::from_label("direct"), s.logic_v1)
            .unwrap()
            .address;
        s.manager
            .lock_direct_proxy(&mut s.ledger, s.owner, proxy)
            .unwrap();

        for implementation in [Address::from_label("nowhere"), Address::ZERO, s.logic_v2] {
            let err = registry_error(s.manager.set_direct_implementation(
                &mut s.ledger,
                s.owner,
                proxy,
                implementation,
            ));
            assert_eq!(err, RegistryError::AlreadyLocked);
        }
    }

    #[test]
    fn test_unknown_direct_proxy_is_not_found() {
        let mut s = setup();
        let err = registry_error(s.manager.set_direct_implementation(
            &mut s.ledger,
            s.owner,
            s.logic_v1,
            s.logic_v2,
        ));
        assert_eq!(err, RegistryError::ProxyNotFound(s.logic_v1));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_relationship_lifecycle() {
        let mut s = setup();
        let id = ImplementationId::from_label("logic");

        let holder = s.manager.compute_holder_address(&mut s.ledger, id).unwrap();
        assert_eq!(holder, derive_holder_address(&s.manager.address(), &id));
        assert_eq!(s.manager.relationship(&mut s.ledger, id).unwrap(), None);

        s.manager
            .create_indirect_relationship(&mut s.ledger, s.owner, id, s.logic_v1)
            .unwrap();
        assert!(s.ledger.has_code(&holder));
        assert_eq!(
            s.manager.relationship(&mut s.ledger, id).unwrap(),
            Some(Relationship {
                implementation_id: id,
                implementation: s.logic_v1,
                holder,
                locked: false,
            })
        );
        assert_eq!(
            s.manager.implementation_holder(&mut s.ledger, id).unwrap(),
            holder
        );

        let err = registry_error(s.manager.create_indirect_relationship(
            &mut s.ledger,
            s.owner,
            id,
            s.logic_v2,
        ));
        assert_eq!(err, RegistryError::RelationshipExists(id));

        s.manager
            .set_indirect_implementation(&mut s.ledger, s.owner, id, s.logic_v2)
            .unwrap();
        s.manager
            .lock_indirect_relationship(&mut s.ledger, s.owner, id)
            .unwrap();
        assert!(s.manager.is_relationship_locked(&mut s.ledger, id).unwrap());

        let err = registry_error(s.manager.set_indirect_implementation(
            &mut s.ledger,
            s.owner,
            id,
            s.logic_v1,
        ));
        assert_eq!(err, RegistryError::AlreadyLocked);
        let err = registry_error(s.manager.lock_indirect_relationship(&mut s.ledger, s.owner, id));
        assert_eq!(err, RegistryError::AlreadyLocked);
        assert_eq!(
            s.manager
                .relationship(&mut s.ledger, id)
                .unwrap()
                .map(|r| r.implementation),
            Some(s.logic_v2)
        );
    }

    #[test]
    fn test_indirect_proxy_needs_relationship() {
        let mut s = setup();
        let id = ImplementationId::from_label("missing");

        let err = registry_error(s.manager.deploy_indirect_proxy(
            &mut s.ledger,
            s.owner,
            id,
            Salt::from_label("proxy"),
        ));
        assert_eq!(err, RegistryError::RelationshipNotFound(id));
        let err = registry_error(s.manager.implementation_holder(&mut s.ledger, id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_indirect_proxy_lands_at_computed_address() {
        let mut s = setup();
        let id = ImplementationId::from_label("logic");
        let proxy_id = Salt::from_label("proxy");
        s.manager
            .create_indirect_relationship(&mut s.ledger, s.owner, id, s.logic_v1)
            .unwrap();

        let computed = s
            .manager
            .compute_indirect_proxy_address(&mut s.ledger, s.owner, id, proxy_id)
            .unwrap();
        let deployed = s
            .manager
            .deploy_indirect_proxy(&mut s.ledger, s.owner, id, proxy_id)
            .unwrap()
            .address;
        assert_eq!(deployed, computed);

        let err = registry_error(s.manager.deploy_indirect_proxy(
            &mut s.ledger,
            s.owner,
            id,
            proxy_id,
        ));
        assert_eq!(err, RegistryError::DuplicateDeployment(deployed));
    }

    #[test]
    fn test_approved_deployer_may_only_deploy() {
        let mut s = setup();
        let deployer = Address::from_label("deployer");
        let salt = Salt::from_label("direct");

        let err = registry_error(s.manager.deploy_direct_proxy(
            &mut s.ledger,
            deployer,
            salt,
            s.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotApprovedDeployer);

        s.manager
            .approve_deployer(&mut s.ledger, s.owner, deployer)
            .unwrap();
        assert!(s.manager.is_approved_deployer(&mut s.ledger, deployer).unwrap());

        let proxy = s
            .manager
            .deploy_direct_proxy(&mut s.ledger, deployer, salt, s.logic_v1)
            .unwrap()
            .address;
        assert_eq!(
            proxy,
            derive_direct_proxy_address(&s.manager.address(), &deployer, &salt)
        );

        let err = registry_error(s.manager.create_indirect_relationship(
            &mut s.ledger,
            deployer,
            ImplementationId::from_label("logic"),
            s.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotOwner);

        s.manager
            .revoke_deployer_approval(&mut s.ledger, s.owner, deployer)
            .unwrap();
        let err = registry_error(s.manager.deploy_direct_proxy(
            &mut s.ledger,
            deployer,
            Salt::from_label("again"),
            s.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotApprovedDeployer);
    }

    #[test]
    fn test_ownership_transfer_moves_control() {
        let mut s = setup();
        let successor = Address::from_label("successor");

        let receipt = s
            .manager
            .transfer_ownership(&mut s.ledger, s.owner, successor)
            .unwrap();
        assert_eq!(
            decode_events(&receipt, &[s.manager.address()]),
            vec![(
                s.manager.address(),
                RegistryEvent::OwnershipTransferred {
                    previous_owner: s.owner,
                    new_owner: successor,
                }
            )]
        );
        assert_eq!(s.manager.owner(&mut s.ledger).unwrap(), successor);

        let err = registry_error(s.manager.approve_deployer(&mut s.ledger, s.owner, s.owner));
        assert_eq!(err, RegistryError::NotOwner);
    }

    #[test]
    fn test_malformed_call_is_rejected() {
        let mut s = setup();
        let err = s
            .ledger
            .transact(s.owner, s.manager.address(), &[0xff, 0xff, 0xff, 0xff])
            .unwrap_err();
        assert_eq!(
            err.revert().and_then(RegistryError::from_revert),
            Some(RegistryError::MalformedCall)
        );
    }

    #[test]
    fn test_deployer_approval_is_idempotent() {
        let mut s = setup();
        let deployer = Address::from_label("deployer");
        let stranger = Address::from_label("stranger");

        s.manager.approve_deployer(&mut s.ledger, s.owner, deployer).unwrap();
        s.manager.approve_deployer(&mut s.ledger, s.owner, deployer).unwrap();
        assert!(s.manager.is_approved_deployer(&mut s.ledger, deployer).unwrap());

        s.manager
            .revoke_deployer_approval(&mut s.ledger, s.owner, stranger)
            .unwrap();
        assert!(!s.manager.is_approved_deployer(&mut s.ledger, stranger).unwrap());
        assert!(s.manager.is_approved_deployer(&mut s.ledger, deployer).unwrap());

        s.manager
            .revoke_deployer_approval(&mut s.ledger, s.owner, deployer)
            .unwrap();
        s.manager
            .revoke_deployer_approval(&mut s.ledger, s.owner, deployer)
            .unwrap();
        assert!(!s.manager.is_approved_deployer(&mut s.ledger, deployer).unwrap());
    }
}
