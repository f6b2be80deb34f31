//! Logic units and wiring shared by the registry tests.

use std::sync::Arc;

use proxies_core::Address;
use proxies_ledger::{CallContext, Ledger, Program, Revert, Slot, StorageValue};
use serde::{Deserialize, Serialize};

use crate::client::Registry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterCall {
    Increment,
    Count,
    Caller,
    Fail,
}

pub const COUNTER_FAILURE: &[u8] = b"counter failure";

/// Logic unit counting calls in whatever storage it runs against
pub struct Counter {
    step: u64,
    image: &'static [u8],
}

impl Counter {
    pub fn v1() -> Self {
        Self {
            step: 1,
            image: b"test/counter/1",
        }
    }

    pub fn v2() -> Self {
        Self {
            step: 2,
            image: b"test/counter/2",
        }
    }

    fn count() -> StorageValue<u64> {
        StorageValue::new("test.counter.count")
    }

    pub fn count_slot() -> Slot {
        Self::count().slot()
    }
}

impl Program for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn image(&self) -> &[u8] {
        self.image
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        match bincode::deserialize(input)? {
            CounterCall::Increment => {
                let count = Self::count().get(ctx)?.unwrap_or(0) + self.step;
                Self::count().set(ctx, &count)?;
                Ok(bincode::serialize(&count)?)
            }
            CounterCall::Count => Ok(bincode::serialize(&Self::count().get(ctx)?.unwrap_or(0))?),
            CounterCall::Caller => Ok(bincode::serialize(&ctx.caller())?),
            CounterCall::Fail => Err(Revert::program(COUNTER_FAILURE.to_vec())),
        }
    }
}

pub struct Fixture {
    pub ledger: Ledger,
    pub registry: Registry,
    pub owner: Address,
    pub logic_v1: Address,
    pub logic_v2: Address,
}

impl Fixture {
    pub fn new() -> Self {
        let mut ledger = Ledger::in_memory();
        let owner = Address::from_label("owner");
        let registry = Registry::genesis(&mut ledger, owner).unwrap();
        let logic_v1 = deploy_logic(&mut ledger, owner, Counter::v1());
        let logic_v2 = deploy_logic(&mut ledger, owner, Counter::v2());
        Self {
            ledger,
            registry,
            owner,
            logic_v1,
            logic_v2,
        }
    }

    /// Call `target` as `from` and decode the output
    pub fn call_counter<T: serde::de::DeserializeOwned>(
        &mut self,
        from: Address,
        target: Address,
        call: CounterCall,
    ) -> T {
        let receipt = self
            .ledger
            .transact(from, target, &bincode::serialize(&call).unwrap())
            .unwrap();
        bincode::deserialize(&receipt.output).unwrap()
    }
}

pub fn deploy_logic(
    ledger: &mut Ledger,
    from: Address,
    program: impl Program + 'static,
) -> Address {
    ledger
        .deploy(from, Arc::new(program), &[])
        .unwrap()
        .contract_address
        .unwrap()
}
