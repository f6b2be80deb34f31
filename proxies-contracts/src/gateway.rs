use log::debug;
use proxies_core::Address;
use proxies_ledger::{CallContext, Program, Revert, StorageMap, StorageValue};

use crate::abi::{decode, encode, GatewayCall, ManagerCall};
use crate::error::RegistryError;
use crate::events::RegistryEvent;

pub const ACCESS_GATEWAY_IMAGE: &[u8] = b"proxies/access-gateway/1";

/// Permission layer in front of a deployment manager.
///
/// Tiers, from most to least privileged:
/// * owner: everything, and the only tier that may manage admins, set or lock
///   implementations, or transfer ownership
/// * admin: approve deployers, create relationships, deploy proxies
/// * approved deployer: deploy proxies only
///
/// Permitted calls are forwarded to the manager with the gateway as the caller, so
/// the gateway is the origin of every proxy it deploys. Approved deployers are
/// recorded by the manager and read back from it.
pub struct AccessGateway;

impl AccessGateway {
    fn owner() -> StorageValue<Address> {
        StorageValue::new("proxies.gateway.owner")
    }

    fn manager() -> StorageValue<Address> {
        StorageValue::new("proxies.gateway.manager")
    }

    fn admins() -> StorageMap<Address, bool> {
        StorageMap::new("proxies.gateway.admins")
    }

    fn proxy_manager(ctx: &CallContext<'_>) -> Result<Address, Revert> {
        Ok(Self::manager().get(ctx)?.unwrap_or(Address::ZERO))
    }

    fn is_owner(ctx: &CallContext<'_>, account: &Address) -> Result<bool, Revert> {
        Ok(Self::owner().get(ctx)?.as_ref() == Some(account))
    }

    fn is_admin(ctx: &CallContext<'_>, account: &Address) -> Result<bool, Revert> {
        Ok(Self::admins().get(ctx, account)?.unwrap_or(false))
    }

    fn is_approved_deployer(ctx: &mut CallContext<'_>, account: Address) -> Result<bool, Revert> {
        let manager = Self::proxy_manager(ctx)?;
        let call = encode(&ManagerCall::IsApprovedDeployer { account })?;
        let output = ctx.static_call(manager, &call)?;
        Ok(decode(&output)?)
    }

    fn can_administer(ctx: &CallContext<'_>, account: &Address) -> Result<bool, Revert> {
        Ok(Self::is_owner(ctx, account)? || Self::is_admin(ctx, account)?)
    }

    fn can_deploy(ctx: &mut CallContext<'_>, account: Address) -> Result<bool, Revert> {
        Ok(Self::can_administer(ctx, &account)? || Self::is_approved_deployer(ctx, account)?)
    }

    fn only_owner(ctx: &CallContext<'_>) -> Result<(), Revert> {
        if !Self::is_owner(ctx, &ctx.caller())? {
            return Err(RegistryError::NotOwner.into());
        }
        Ok(())
    }

    fn only_admin_or_owner(ctx: &CallContext<'_>) -> Result<(), Revert> {
        if !Self::can_administer(ctx, &ctx.caller())? {
            return Err(RegistryError::NotAdminOrOwner.into());
        }
        Ok(())
    }

    fn only_deployer(ctx: &mut CallContext<'_>) -> Result<(), Revert> {
        let caller = ctx.caller();
        if !Self::can_deploy(ctx, caller)? {
            return Err(RegistryError::NotApprovedDeployer.into());
        }
        Ok(())
    }

    /// Forward a permitted call to the manager, returning its output untouched
    fn forward(ctx: &mut CallContext<'_>, call: &ManagerCall) -> Result<Vec<u8>, Revert> {
        let manager = Self::proxy_manager(ctx)?;
        ctx.call(manager, &encode(call)?)
    }

    fn set_admin_access(
        ctx: &mut CallContext<'_>,
        account: Address,
        granted: bool,
    ) -> Result<Vec<u8>, Revert> {
        Self::only_owner(ctx)?;
        if granted {
            Self::admins().set(ctx, &account, &true)?;
        } else {
            Self::admins().remove(ctx, &account)?;
        }

        debug!("Admin access for {} set to {}", account, granted);
        RegistryEvent::AdminAccessChanged { account, granted }.publish(ctx)?;
        Ok(Vec::new())
    }

    fn transfer_ownership(
        ctx: &mut CallContext<'_>,
        new_owner: Address,
    ) -> Result<Vec<u8>, Revert> {
        Self::only_owner(ctx)?;
        let previous_owner = ctx.caller();
        Self::owner().set(ctx, &new_owner)?;

        debug!("Gateway ownership moved from {} to {}", previous_owner, new_owner);
        RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        }
        .publish(ctx)?;
        Ok(Vec::new())
    }

    fn dispatch(ctx: &mut CallContext<'_>, call: GatewayCall) -> Result<Vec<u8>, Revert> {
        match call {
            GatewayCall::GrantAdminAccess { account } => Self::set_admin_access(ctx, account, true),
            GatewayCall::RevokeAdminAccess { account } => {
                Self::set_admin_access(ctx, account, false)
            }
            GatewayCall::ApproveDeployer { deployer } => {
                Self::only_admin_or_owner(ctx)?;
                Self::forward(ctx, &ManagerCall::ApproveDeployer { deployer })
            }
            GatewayCall::RevokeDeployerApproval { deployer } => {
                Self::only_admin_or_owner(ctx)?;
                Self::forward(ctx, &ManagerCall::RevokeDeployerApproval { deployer })
            }
            GatewayCall::CreateIndirectRelationship {
                implementation_id,
                implementation,
            } => {
                Self::only_admin_or_owner(ctx)?;
                Self::forward(
                    ctx,
                    &ManagerCall::CreateIndirectRelationship {
                        implementation_id,
                        implementation,
                    },
                )
            }
            GatewayCall::SetIndirectImplementation {
                implementation_id,
                implementation,
            } => {
                Self::only_owner(ctx)?;
                Self::forward(
                    ctx,
                    &ManagerCall::SetIndirectImplementation {
                        implementation_id,
                        implementation,
                    },
                )
            }
            GatewayCall::LockIndirectRelationship { implementation_id } => {
                Self::only_owner(ctx)?;
                Self::forward(ctx, &ManagerCall::LockIndirectRelationship { implementation_id })
            }
            GatewayCall::DeployDirectProxy {
                salt,
                implementation,
            } => {
                Self::only_deployer(ctx)?;
                Self::forward(
                    ctx,
                    &ManagerCall::DeployDirectProxy {
                        salt,
                        implementation,
                    },
                )
            }
            GatewayCall::SetDirectImplementation {
                proxy,
                implementation,
            } => {
                Self::only_owner(ctx)?;
                Self::forward(
                    ctx,
                    &ManagerCall::SetDirectImplementation {
                        proxy,
                        implementation,
                    },
                )
            }
            GatewayCall::LockDirectProxy { proxy } => {
                Self::only_owner(ctx)?;
                Self::forward(ctx, &ManagerCall::LockDirectProxy { proxy })
            }
            GatewayCall::DeployIndirectProxy {
                implementation_id,
                proxy_id,
            } => {
                Self::only_deployer(ctx)?;
                Self::forward(
                    ctx,
                    &ManagerCall::DeployIndirectProxy {
                        implementation_id,
                        proxy_id,
                    },
                )
            }
            GatewayCall::TransferOwnership { new_owner } => {
                Self::transfer_ownership(ctx, new_owner)
            }
            GatewayCall::TransferManagerOwnership { new_owner } => {
                Self::only_owner(ctx)?;
                Self::forward(ctx, &ManagerCall::TransferOwnership { new_owner })
            }

            GatewayCall::Owner => Ok(encode(&Self::owner().get(ctx)?.unwrap_or(Address::ZERO))?),
            GatewayCall::ProxyManager => Ok(encode(&Self::proxy_manager(ctx)?)?),
            GatewayCall::HasAdminAccess { account } => Ok(encode(&Self::is_admin(ctx, &account)?)?),
            GatewayCall::IsApprovedDeployer { account } => {
                Ok(encode(&Self::is_approved_deployer(ctx, account)?)?)
            }
            GatewayCall::ComputeDirectProxyAddress { deployer, salt } => {
                Self::forward(ctx, &ManagerCall::ComputeDirectProxyAddress { deployer, salt })
            }
            GatewayCall::ComputeIndirectProxyAddress {
                deployer,
                implementation_id,
                proxy_id,
            } => Self::forward(
                ctx,
                &ManagerCall::ComputeIndirectProxyAddress {
                    deployer,
                    implementation_id,
                    proxy_id,
                },
            ),
            GatewayCall::ComputeHolderAddress { implementation_id } => {
                Self::forward(ctx, &ManagerCall::ComputeHolderAddress { implementation_id })
            }
        }
    }
}

impl Program for AccessGateway {
    fn name(&self) -> &str {
        "access-gateway"
    }

    fn image(&self) -> &[u8] {
        ACCESS_GATEWAY_IMAGE
    }

    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let manager: Address = decode(args)?;
        let owner = ctx.caller();
        Self::manager().set(ctx, &manager)?;
        Self::owner().set(ctx, &owner)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let call: GatewayCall = decode(input)?;
        Self::dispatch(ctx, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ErrorKind};
    use crate::events::decode_events;
    use crate::testing::{CounterCall, Fixture};
    use proxies_core::{ImplementationId, Salt};

    fn registry_error(result: Result<impl std::fmt::Debug, ClientError>) -> RegistryError {
        match result {
            Err(ClientError::Registry(err)) => err,
            other => panic!("expected a registry error, got {:?}", other),
        }
    }

    #[test]
    fn test_genesis_wiring() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let manager = f.registry.manager;

        assert_eq!(gateway.owner(&mut f.ledger).unwrap(), f.owner);
        assert_eq!(gateway.proxy_manager(&mut f.ledger).unwrap(), manager.address());
        assert_eq!(manager.owner(&mut f.ledger).unwrap(), gateway.address());
        assert!(!gateway.has_admin_access(&mut f.ledger, f.owner).unwrap());
    }

    #[test]
    fn test_outsider_is_denied_every_mutation() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let id = ImplementationId::from_label("logic");
        gateway
            .create_indirect_relationship(&mut f.ledger, f.owner, id, f.logic_v1)
            .unwrap();
        let proxy = gateway
            .deploy_direct_proxy(&mut f.ledger, f.owner, Salt::from_label("direct"), f.logic_v1)
            .unwrap()
            .address;

        let outsider = Address::from_label("outsider");
        let ledger = &mut f.ledger;
        let (v1, v2) = (f.logic_v1, f.logic_v2);
        let attempts = vec![
            registry_error(gateway.grant_admin_access(ledger, outsider, outsider)),
            registry_error(gateway.revoke_admin_access(ledger, outsider, f.owner)),
            registry_error(gateway.approve_deployer(ledger, outsider, outsider)),
            registry_error(gateway.revoke_deployer_approval(ledger, outsider, outsider)),
            registry_error(gateway.create_indirect_relationship(
                ledger,
                outsider,
                ImplementationId::from_label("other"),
                v1,
            )),
            registry_error(gateway.set_indirect_implementation(ledger, outsider, id, v2)),
            registry_error(gateway.lock_indirect_relationship(ledger, outsider, id)),
            registry_error(gateway.deploy_direct_proxy(
                ledger,
                outsider,
                Salt::from_label("mine"),
                v1,
            )),
            registry_error(gateway.set_direct_implementation(ledger, outsider, proxy, v2)),
            registry_error(gateway.lock_direct_proxy(ledger, outsider, proxy)),
            registry_error(gateway.deploy_indirect_proxy(
                ledger,
                outsider,
                id,
                Salt::from_label("mine"),
            )),
            registry_error(gateway.transfer_ownership(ledger, outsider, outsider)),
            registry_error(gateway.transfer_manager_ownership(ledger, outsider, outsider)),
        ];

        for err in attempts {
            assert_eq!(err.kind(), ErrorKind::PermissionDenied, "{:?}", err);
        }
        assert_eq!(gateway.owner(&mut f.ledger).unwrap(), f.owner);
        assert_eq!(
            f.registry.manager.direct_implementation(&mut f.ledger, proxy).unwrap(),
            f.logic_v1
        );
    }

    #[test]
    fn test_admin_tier() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let admin = Address::from_label("admin");

        let receipt = gateway.grant_admin_access(&mut f.ledger, f.owner, admin).unwrap();
        assert_eq!(
            decode_events(&receipt, &[gateway.address()]),
            vec![(
                gateway.address(),
                RegistryEvent::AdminAccessChanged {
                    account: admin,
                    granted: true,
                }
            )]
        );
        assert!(gateway.has_admin_access(&mut f.ledger, admin).unwrap());

        let id = ImplementationId::from_label("logic");
        gateway
            .create_indirect_relationship(&mut f.ledger, admin, id, f.logic_v1)
            .unwrap();
        gateway
            .approve_deployer(&mut f.ledger, admin, Address::from_label("deployer"))
            .unwrap();
        let proxy = gateway
            .deploy_direct_proxy(&mut f.ledger, admin, Salt::from_label("direct"), f.logic_v1)
            .unwrap()
            .address;
        gateway
            .deploy_indirect_proxy(&mut f.ledger, admin, id, Salt::from_label("indirect"))
            .unwrap();

        let err = registry_error(gateway.set_direct_implementation(
            &mut f.ledger,
            admin,
            proxy,
            f.logic_v2,
        ));
        assert_eq!(err, RegistryError::NotOwner);
        let err = registry_error(gateway.lock_indirect_relationship(&mut f.ledger, admin, id));
        assert_eq!(err, RegistryError::NotOwner);
        let err = registry_error(gateway.grant_admin_access(
            &mut f.ledger,
            admin,
            Address::from_label("friend"),
        ));
        assert_eq!(err, RegistryError::NotOwner);

        gateway.revoke_admin_access(&mut f.ledger, f.owner, admin).unwrap();
        assert!(!gateway.has_admin_access(&mut f.ledger, admin).unwrap());
        let err = registry_error(gateway.approve_deployer(&mut f.ledger, admin, admin));
        assert_eq!(err, RegistryError::NotAdminOrOwner);
    }

    #[test]
    fn test_approved_deployer_tier() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let deployer = Address::from_label("deployer");
        let id = ImplementationId::from_label("logic");
        gateway
            .create_indirect_relationship(&mut f.ledger, f.owner, id, f.logic_v1)
            .unwrap();

        let err = registry_error(gateway.deploy_direct_proxy(
            &mut f.ledger,
            deployer,
            Salt::from_label("direct"),
            f.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotApprovedDeployer);

        gateway.approve_deployer(&mut f.ledger, f.owner, deployer).unwrap();
        assert!(gateway.is_approved_deployer(&mut f.ledger, deployer).unwrap());
        assert!(f
            .registry
            .manager
            .is_approved_deployer(&mut f.ledger, deployer)
            .unwrap());

        let salt = Salt::from_label("direct");
        let expected = gateway
            .compute_direct_proxy_address(&mut f.ledger, gateway.address(), salt)
            .unwrap();
        let direct = gateway
            .deploy_direct_proxy(&mut f.ledger, deployer, salt, f.logic_v1)
            .unwrap();
        assert_eq!(direct.address, expected);

        let proxy_id = Salt::from_label("indirect");
        let expected = gateway
            .compute_indirect_proxy_address(&mut f.ledger, gateway.address(), id, proxy_id)
            .unwrap();
        let indirect = gateway
            .deploy_indirect_proxy(&mut f.ledger, deployer, id, proxy_id)
            .unwrap();
        assert_eq!(indirect.address, expected);

        let err = registry_error(gateway.approve_deployer(&mut f.ledger, deployer, deployer));
        assert_eq!(err, RegistryError::NotAdminOrOwner);
        let err = registry_error(gateway.create_indirect_relationship(
            &mut f.ledger,
            deployer,
            ImplementationId::from_label("other"),
            f.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotAdminOrOwner);
        let err = registry_error(gateway.lock_direct_proxy(
            &mut f.ledger,
            deployer,
            direct.address,
        ));
        assert_eq!(err, RegistryError::NotOwner);

        gateway
            .revoke_deployer_approval(&mut f.ledger, f.owner, deployer)
            .unwrap();
        let err = registry_error(gateway.deploy_direct_proxy(
            &mut f.ledger,
            deployer,
            Salt::from_label("again"),
            f.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotApprovedDeployer);
    }

    #[test]
    fn test_manager_rejections_pass_through() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let salt = Salt::from_label("direct");
        let proxy = gateway
            .deploy_direct_proxy(&mut f.ledger, f.owner, salt, f.logic_v1)
            .unwrap()
            .address;

        let err = registry_error(gateway.deploy_direct_proxy(
            &mut f.ledger,
            f.owner,
            salt,
            f.logic_v2,
        ));
        assert_eq!(err, RegistryError::DuplicateDeployment(proxy));

        let missing = ImplementationId::from_label("missing");
        let err = registry_error(gateway.deploy_indirect_proxy(
            &mut f.ledger,
            f.owner,
            missing,
            salt,
        ));
        assert_eq!(err, RegistryError::RelationshipNotFound(missing));

        gateway.lock_direct_proxy(&mut f.ledger, f.owner, proxy).unwrap();
        let err = registry_error(gateway.set_direct_implementation(
            &mut f.ledger,
            f.owner,
            proxy,
            f.logic_v2,
        ));
        assert_eq!(err, RegistryError::AlreadyLocked);
    }

    #[test]
    fn test_owner_updates_direct_proxy() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let proxy = gateway
            .deploy_direct_proxy(&mut f.ledger, f.owner, Salt::from_label("direct"), f.logic_v1)
            .unwrap()
            .address;
        let user = Address::from_label("user");

        assert_eq!(f.call_counter::<u64>(user, proxy, CounterCall::Increment), 1);
        gateway
            .set_direct_implementation(&mut f.ledger, f.owner, proxy, f.logic_v2)
            .unwrap();
        assert_eq!(f.call_counter::<u64>(user, proxy, CounterCall::Increment), 3);
    }

    #[test]
    fn test_ownership_transfers() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let successor = Address::from_label("successor");

        gateway.transfer_ownership(&mut f.ledger, f.owner, successor).unwrap();
        assert_eq!(gateway.owner(&mut f.ledger).unwrap(), successor);
        let err = registry_error(gateway.grant_admin_access(&mut f.ledger, f.owner, f.owner));
        assert_eq!(err, RegistryError::NotOwner);

        gateway
            .transfer_manager_ownership(&mut f.ledger, successor, successor)
            .unwrap();
        assert_eq!(f.registry.manager.owner(&mut f.ledger).unwrap(), successor);

        // The gateway no longer controls the manager
        let err = registry_error(gateway.deploy_direct_proxy(
            &mut f.ledger,
            successor,
            Salt::from_label("direct"),
            f.logic_v1,
        ));
        assert_eq!(err, RegistryError::NotApprovedDeployer);
    }

    #[test]
    fn test_access_changes_are_idempotent() {
        let mut f = Fixture::new();
        let gateway = f.registry.gateway;
        let admin = Address::from_label("admin");
        let deployer = Address::from_label("deployer");
        let stranger = Address::from_label("stranger");

        gateway.grant_admin_access(&mut f.ledger, f.owner, admin).unwrap();
        gateway.grant_admin_access(&mut f.ledger, f.owner, admin).unwrap();
        assert!(gateway.has_admin_access(&mut f.ledger, admin).unwrap());

        gateway.approve_deployer(&mut f.ledger, f.owner, deployer).unwrap();
        gateway.approve_deployer(&mut f.ledger, admin, deployer).unwrap();
        assert!(gateway.is_approved_deployer(&mut f.ledger, deployer).unwrap());

        gateway.revoke_admin_access(&mut f.ledger, f.owner, stranger).unwrap();
        gateway
            .revoke_deployer_approval(&mut f.ledger, f.owner, stranger)
            .unwrap();
        assert!(!gateway.has_admin_access(&mut f.ledger, stranger).unwrap());
        assert!(!gateway.is_approved_deployer(&mut f.ledger, stranger).unwrap());
        assert!(gateway.has_admin_access(&mut f.ledger, admin).unwrap());
        assert!(gateway.is_approved_deployer(&mut f.ledger, deployer).unwrap());

        for _ in 0..2 {
            gateway.revoke_admin_access(&mut f.ledger, f.owner, admin).unwrap();
            gateway
                .revoke_deployer_approval(&mut f.ledger, f.owner, deployer)
                .unwrap();
        }
        assert!(!gateway.has_admin_access(&mut f.ledger, admin).unwrap());
        assert!(!gateway.is_approved_deployer(&mut f.ledger, deployer).unwrap());
    }
}
