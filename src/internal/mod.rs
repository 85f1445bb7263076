//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use circular::MaterializeGuard;
pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag, HookId};
