//! The closed algebra of parameter changes.
//!
//! Every admin-driven mutation of [`NetworkParameters`] is one of these
//! variants, applied through [`Change::apply`]. Each application advances
//! the epoch by exactly one and stamps the modified time.

use crate::{NetworkParameters, NotaryInfo, SecureHash, Whitelist};

/// One mutation of the network parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Append a notary; a no-op if the identity is already listed.
    AddNotary(NotaryInfo),
    /// Remove the notary whose legal name hashes to the given value; a
    /// no-op if absent.
    RemoveNotary(SecureHash),
    /// Union entries into the whitelist.
    AppendWhiteList(Whitelist),
    /// Replace the whitelist wholesale.
    ReplaceWhiteList(Whitelist),
    /// Empty the whitelist.
    ClearWhiteList,
}

impl Change {
    /// Applies this change, producing the successor document.
    ///
    /// Total over all variants; "no-op" changes still advance the epoch,
    /// since the document was re-issued.
    #[must_use]
    pub fn apply(self, params: &NetworkParameters) -> NetworkParameters {
        params.evolve(|next| match self {
            Change::AddNotary(notary) => {
                let present = next
                    .notaries
                    .iter()
                    .any(|n| n.identity == notary.identity);
                if !present {
                    next.notaries.push(notary);
                }
            }
            Change::RemoveNotary(name_hash) => {
                next.notaries
                    .retain(|n| n.identity.name.hash() != name_hash);
            }
            Change::AppendWhiteList(entries) => {
                for (fqn, hashes) in entries {
                    next.whitelist.entry(fqn).or_default().extend(hashes);
                }
            }
            Change::ReplaceWhiteList(entries) => next.whitelist = entries,
            Change::ClearWhiteList => next.whitelist.clear(),
        })
    }

    /// Short operator-facing description, used as the update description
    /// when none is supplied.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Change::AddNotary(_) => "notary added",
            Change::RemoveNotary(_) => "notary removed",
            Change::AppendWhiteList(_) => "whitelist appended",
            Change::ReplaceWhiteList(_) => "whitelist replaced",
            Change::ClearWhiteList => "whitelist cleared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LegalIdentity, Timestamp};
    use netmap_identity::Keypair;
    use pretty_assertions::assert_eq;

    fn notary(name: &str) -> NotaryInfo {
        NotaryInfo::new(
            LegalIdentity::new(name, Keypair::generate().public_key()),
            true,
        )
    }

    fn base() -> NetworkParameters {
        NetworkParameters::template(Timestamp::now())
    }

    fn whitelist(fqn: &str, seed: u8) -> Whitelist {
        let mut wl = Whitelist::new();
        wl.entry(fqn.to_string())
            .or_default()
            .insert(SecureHash::compute(&[seed]));
        wl
    }

    #[test]
    fn add_notary_appends_once() {
        let n = notary("O=Notary, C=GB");
        let once = Change::AddNotary(n.clone()).apply(&base());
        let twice = Change::AddNotary(n).apply(&once);
        assert_eq!(once.notaries.len(), 1);
        assert_eq!(twice.notaries.len(), 1);
        assert_eq!(twice.epoch, 3);
    }

    #[test]
    fn remove_notary_by_name_hash() {
        let n = notary("O=Notary, C=GB");
        let name_hash = n.identity.name.hash();
        let params = Change::AddNotary(n).apply(&base());
        let removed = Change::RemoveNotary(name_hash).apply(&params);
        assert!(removed.notaries.is_empty());
    }

    #[test]
    fn remove_absent_notary_is_noop() {
        let params = Change::AddNotary(notary("O=Notary, C=GB")).apply(&base());
        let removed = Change::RemoveNotary(SecureHash::compute(b"unknown")).apply(&params);
        assert_eq!(removed.notaries.len(), 1);
        assert_eq!(removed.epoch, params.epoch + 1);
    }

    #[test]
    fn append_whitelist_unions() {
        let params = Change::AppendWhiteList(whitelist("com.example.Cash", 1)).apply(&base());
        let params = Change::AppendWhiteList(whitelist("com.example.Cash", 2)).apply(&params);
        assert_eq!(params.whitelist["com.example.Cash"].len(), 2);
    }

    #[test]
    fn append_whitelist_is_idempotent_modulo_epoch() {
        let wl = whitelist("com.example.Cash", 1);
        let once = Change::AppendWhiteList(wl.clone()).apply(&base());
        let twice = Change::AppendWhiteList(wl).apply(&once);
        assert_eq!(once.whitelist, twice.whitelist);
    }

    #[test]
    fn replace_and_clear_whitelist() {
        let params = Change::AppendWhiteList(whitelist("com.example.Cash", 1)).apply(&base());
        let replaced = Change::ReplaceWhiteList(whitelist("com.example.Bond", 2)).apply(&params);
        assert!(!replaced.whitelist.contains_key("com.example.Cash"));
        assert!(replaced.whitelist.contains_key("com.example.Bond"));

        let cleared = Change::ClearWhiteList.apply(&replaced);
        assert!(cleared.whitelist.is_empty());
    }

    #[test]
    fn composition_bumps_epoch_twice() {
        let a = notary("O=A, C=GB");
        let b = notary("O=B, C=GB");
        let composed = Change::AddNotary(b).apply(&Change::AddNotary(a).apply(&base()));
        assert_eq!(composed.epoch, 3);
        assert_eq!(composed.notaries.len(), 2);
    }
}
