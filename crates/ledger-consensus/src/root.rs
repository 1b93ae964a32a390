//! Qualified-root computation: `(root, previous)`, unique
//! per chain position, shared by every fork candidate at that position.
//! The block processor (C6) already knows the account a candidate would
//! extend (it resolved that while classifying the block), so this helper
//! just assembles the pair rather than re-deriving the account itself.

use ledger_primitives::prelude::*;

/// `previous = None` for the first block of a chain: its root is the
/// account itself, and its qualified root carries a zero
/// `previous` since there is no predecessor hash to disambiguate against.
pub fn qualified_root_for(account: AccountId, previous: Option<BlockHash>) -> QualifiedRoot {
    let root = match previous {
        Some(hash) => Root::Block(hash),
        None => Root::Account(account),
    };
    QualifiedRoot::new(root.as_buf(), previous.unwrap_or(BlockHash::zero()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn unopened_chain_roots_on_the_account() {
        let a = acct(1);
        let qr = qualified_root_for(a, None);
        assert_eq!(qr.root, a.0);
        assert_eq!(qr.previous, BlockHash::zero());
    }

    #[test]
    fn opened_chain_roots_on_previous_hash() {
        let a = acct(1);
        let prev = BlockHash::from(Buf32::from([9u8; 32]));
        let qr = qualified_root_for(a, Some(prev));
        assert_eq!(qr.root, prev.0);
        assert_eq!(qr.previous, prev);
    }

    #[test]
    fn forks_on_the_same_previous_share_a_qualified_root() {
        let a = acct(1);
        let b = acct(2);
        let prev = BlockHash::from(Buf32::from([9u8; 32]));
        assert_eq!(qualified_root_for(a, Some(prev)), qualified_root_for(b, Some(prev)));
    }
}
