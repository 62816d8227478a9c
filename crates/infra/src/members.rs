//! Member registration.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use bookshop_members::{Address, Member, MemberId};

use crate::error::ShopError;
use crate::store::ShopStore;

pub struct MemberService<S> {
    store: Arc<S>,
    // Serializes the duplicate-name check with the insert.
    joining: Mutex<()>,
}

impl<S: ShopStore> MemberService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            joining: Mutex::new(()),
        }
    }

    /// Register a member. Names are unique.
    pub fn join(&self, name: impl Into<String>, address: Address) -> Result<MemberId, ShopError> {
        let member = Member::new(MemberId::generate(), name, address)?;

        let _joining = self.joining.lock();
        let taken = self
            .store
            .list_members()?
            .iter()
            .any(|m| m.name() == member.name());
        if taken {
            return Err(ShopError::DuplicateMember(member.name().to_string()));
        }

        let member_id = member.id_typed();
        self.store.save_member(member)?;
        info!(%member_id, "member joined");
        Ok(member_id)
    }

    pub fn find_member(&self, member_id: MemberId) -> Result<Member, ShopError> {
        self.store
            .load_member(member_id)?
            .ok_or(ShopError::MemberNotFound(member_id))
    }

    /// All members, sorted by name.
    pub fn list_members(&self) -> Result<Vec<Member>, ShopError> {
        let mut members = self.store.list_members()?;
        members.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(members)
    }
}
