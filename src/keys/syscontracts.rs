//! System-contract event keys: mint, burn, proposal, vote, blacklist,
//! member, gas-tip update, emergency pause, deposit-mint proposal,
//! validator change, max-proposals update, execution-skipped,
//! authorized-account (§4.2).

use super::{fmt_address, fmt_u64, Address};

/// A system-contract event kind. The key segment is the lowercase variant
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysEventKind {
    Mint,
    Burn,
    Proposal,
    Vote,
    Blacklist,
    Member,
    GasTipUpdate,
    EmergencyPause,
    DepositMintProposal,
    ValidatorChange,
    MaxProposalsUpdate,
    ExecutionSkipped,
    AuthorizedAccount,
}

impl SysEventKind {
    fn segment(self) -> &'static str {
        match self {
            SysEventKind::Mint => "mint",
            SysEventKind::Burn => "burn",
            SysEventKind::Proposal => "proposal",
            SysEventKind::Vote => "vote",
            SysEventKind::Blacklist => "blacklist",
            SysEventKind::Member => "member",
            SysEventKind::GasTipUpdate => "gastipupdate",
            SysEventKind::EmergencyPause => "emergencypause",
            SysEventKind::DepositMintProposal => "depositmintproposal",
            SysEventKind::ValidatorChange => "validatorchange",
            SysEventKind::MaxProposalsUpdate => "maxproposalsupdate",
            SysEventKind::ExecutionSkipped => "executionskipped",
            SysEventKind::AuthorizedAccount => "authorizedaccount",
        }
    }
}

/// `/data/syscontracts/{kind}/{block}/{seq}` — primary event record, ordered
/// by occurrence.
pub fn syscontracts_event_key(kind: SysEventKind, block: u64, seq: u64) -> String {
    format!("/data/syscontracts/{}/{}/{}", kind.segment(), fmt_u64(block), fmt_u64(seq))
}

pub fn syscontracts_event_prefix(kind: SysEventKind) -> String {
    format!("/data/syscontracts/{}/", kind.segment())
}

/// `/index/syscontracts/{kind}_{actor}/{block}/{seq}` — per-actor secondary
/// index.
pub fn syscontracts_actor_index_key(kind: SysEventKind, actor: &Address, block: u64, seq: u64) -> String {
    format!("/index/syscontracts/{}_{}/{}/{}", kind.segment(), fmt_address(actor), fmt_u64(block), fmt_u64(seq))
}

pub fn syscontracts_actor_index_prefix(kind: SysEventKind, actor: &Address) -> String {
    format!("/index/syscontracts/{}_{}/", kind.segment(), fmt_address(actor))
}

/// Active-set membership kinds: minter, validator, blacklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSetKind {
    Minter,
    Validator,
    Blacklist,
}

impl ActiveSetKind {
    fn segment(self) -> &'static str {
        match self {
            ActiveSetKind::Minter => "minter_active",
            ActiveSetKind::Validator => "validator_active",
            ActiveSetKind::Blacklist => "blacklist_active",
        }
    }
}

/// `/index/syscontracts/{minter|validator|blacklist}_active/{addr}` —
/// presence marker.
pub fn syscontracts_active_key(kind: ActiveSetKind, addr: &Address) -> String {
    format!("/index/syscontracts/{}/{}", kind.segment(), fmt_address(addr))
}

pub fn syscontracts_active_prefix(kind: ActiveSetKind) -> String {
    format!("/index/syscontracts/{}/", kind.segment())
}

/// `/index/syscontracts/total_supply`.
pub fn syscontracts_total_supply_key() -> &'static str {
    "/index/syscontracts/total_supply"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_do_not_collide() {
        let a = syscontracts_event_key(SysEventKind::Mint, 1, 0);
        let b = syscontracts_event_key(SysEventKind::Burn, 1, 0);
        assert_ne!(a, b);
        assert!(a.starts_with(&syscontracts_event_prefix(SysEventKind::Mint)));
    }

    #[test]
    fn actor_index_scoped_per_actor() {
        let addr1 = [1u8; 20];
        let addr2 = [2u8; 20];
        let a = syscontracts_actor_index_key(SysEventKind::Vote, &addr1, 5, 0);
        assert!(a.starts_with(&syscontracts_actor_index_prefix(SysEventKind::Vote, &addr1)));
        assert!(!a.starts_with(&syscontracts_actor_index_prefix(SysEventKind::Vote, &addr2)));
    }

    #[test]
    fn active_set_kinds_are_distinct_namespaces() {
        let addr = [3u8; 20];
        assert_ne!(
            syscontracts_active_key(ActiveSetKind::Minter, &addr),
            syscontracts_active_key(ActiveSetKind::Validator, &addr)
        );
    }
}
