//! A non-cryptographic `EncryptionHelper` for tests.
//!
//! `FakeEncryptionHelper` issues predictable tokens (`enc-0`, `enc-1`, ...
//! and `userenc-<salt>-<n>`) and remembers what each token stands for.
//! It never fails: tokens it did not issue decrypt to `UNKNOWN_TOKEN`.
//! Every call is recorded so tests can assert on interactions.
//!
//! ```
//! use textcrypt::{EncryptionHelper, FakeEncryptionHelper, UNKNOWN_TOKEN};
//!
//! let fake = FakeEncryptionHelper::new();
//! let token = fake.encrypt("hello").unwrap();
//! assert_eq!(fake.decrypt(&token).unwrap(), "hello");
//! assert_eq!(fake.decrypt("not-issued").unwrap(), UNKNOWN_TOKEN);
//!
//! assert!(fake.called_with("encrypt", &["hello"]));
//! fake.clear_calls();
//! assert!(fake.received_calls().is_empty());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::Result;
use crate::helper::EncryptionHelper;

/// Returned when decrypting a token the fake never issued.
pub const UNKNOWN_TOKEN: &str = "<unknown>";

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Trait method name, e.g. `"encrypt_for_user"`.
    pub method: String,
    /// Arguments in call order.
    pub args: Vec<String>,
}

impl Call {
    fn new(method: &str, args: &[&str]) -> Self {
        Self {
            method: method.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug)]
struct Issued {
    token: String,
    // None for tokens from `encrypt`.
    salt: Option<String>,
    plaintext: String,
}

#[derive(Debug, Default)]
struct FakeState {
    counter: u64,
    issued: Vec<Issued>,
    calls: Vec<Call>,
}

impl FakeState {
    fn issue(&mut self, token: String, salt: Option<&str>, plaintext: &str) -> String {
        self.counter += 1;
        self.issued.push(Issued {
            token: token.clone(),
            salt: salt.map(str::to_string),
            plaintext: plaintext.to_string(),
        });
        token
    }

    fn lookup(&self, token: &str, salt: Option<&str>) -> String {
        self.issued
            .iter()
            .find(|i| i.token == token && i.salt.as_deref() == salt)
            .map(|i| i.plaintext.clone())
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string())
    }
}

/// Spy/fake implementation of `EncryptionHelper`.
///
/// State is owned by the instance and guarded by a mutex, so one fake
/// can be shared across threads.
#[derive(Debug, Default)]
pub struct FakeEncryptionHelper {
    state: Mutex<FakeState>,
}

impl FakeEncryptionHelper {
    /// An empty fake: counter at zero, no tokens, no calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `method` was ever called with exactly `args`.
    pub fn called_with(&self, method: &str, args: &[&str]) -> bool {
        self.lock().calls.iter().any(|c| {
            c.method == method && c.args.iter().map(String::as_str).eq(args.iter().copied())
        })
    }

    /// Number of recorded calls to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.method == method).count()
    }

    /// All recorded calls, oldest first.
    pub fn received_calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls. Issued tokens stay resolvable.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Tokens issued so far, in issue order.
    pub fn issued_tokens(&self) -> Vec<String> {
        self.lock().issued.iter().map(|i| i.token.clone()).collect()
    }

    // A panic mid-call cannot leave the state inconsistent, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EncryptionHelper for FakeEncryptionHelper {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut state = self.lock();
        state.calls.push(Call::new("encrypt", &[plaintext]));
        let token = format!("enc-{}", state.counter);
        Ok(state.issue(token, None, plaintext))
    }

    fn decrypt(&self, encrypted_text: &str) -> Result<String> {
        let mut state = self.lock();
        state.calls.push(Call::new("decrypt", &[encrypted_text]));
        Ok(state.lookup(encrypted_text, None))
    }

    fn encrypt_for_user(&self, plaintext: &str, salt_b64: &str) -> Result<String> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::new("encrypt_for_user", &[plaintext, salt_b64]));
        let token = format!("userenc-{salt_b64}-{}", state.counter);
        Ok(state.issue(token, Some(salt_b64), plaintext))
    }

    fn decrypt_for_user(&self, encrypted_text: &str, salt_b64: &str) -> Result<String> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::new("decrypt_for_user", &[encrypted_text, salt_b64]));
        Ok(state.lookup(encrypted_text, Some(salt_b64)))
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn tokens_follow_counter() {
        let fake = FakeEncryptionHelper::new();
        assert_eq!(fake.encrypt("a").unwrap(), "enc-0");
        assert_eq!(fake.encrypt("b").unwrap(), "enc-1");
        assert_eq!(fake.encrypt_for_user("c", "c2FsdA==").unwrap(), "userenc-c2FsdA==-2");
        assert_eq!(fake.issued_tokens(), vec!["enc-0", "enc-1", "userenc-c2FsdA==-2"]);
    }

    #[test]
    fn same_plaintext_gets_distinct_resolvable_tokens() {
        let fake = FakeEncryptionHelper::new();
        let t1 = fake.encrypt("same").unwrap();
        let t2 = fake.encrypt("same").unwrap();
        assert_ne!(t1, t2);
        assert_eq!(fake.decrypt(&t1).unwrap(), "same");
        assert_eq!(fake.decrypt(&t2).unwrap(), "same");
    }

    #[test]
    fn user_token_needs_matching_salt() {
        let fake = FakeEncryptionHelper::new();
        let token = fake.encrypt_for_user("world", "abc123").unwrap();

        assert_eq!(fake.decrypt_for_user(&token, "abc123").unwrap(), "world");
        assert_eq!(fake.decrypt_for_user(&token, "other").unwrap(), UNKNOWN_TOKEN);
        assert_eq!(fake.decrypt(&token).unwrap(), UNKNOWN_TOKEN);
    }

    #[test]
    fn global_token_is_not_a_user_token() {
        let fake = FakeEncryptionHelper::new();
        let token = fake.encrypt("x").unwrap();
        assert_eq!(fake.decrypt_for_user(&token, "abc").unwrap(), UNKNOWN_TOKEN);
    }

    #[test]
    fn different_salts_give_different_tokens() {
        let fake = FakeEncryptionHelper::new();
        let a = fake.encrypt_for_user("p", "s1").unwrap();
        let b = fake.encrypt_for_user("p", "s2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn misses_are_recorded_too() {
        let fake = FakeEncryptionHelper::new();
        assert_eq!(fake.decrypt("garbage-token").unwrap(), UNKNOWN_TOKEN);
        assert!(fake.called_with("decrypt", &["garbage-token"]));
        assert_eq!(fake.call_count("decrypt"), 1);
    }

    #[test]
    fn called_with_matches_exact_args() {
        let fake = FakeEncryptionHelper::new();
        fake.encrypt_for_user("p", "s").unwrap();

        assert!(fake.called_with("encrypt_for_user", &["p", "s"]));
        assert!(!fake.called_with("encrypt_for_user", &["p"]));
        assert!(!fake.called_with("encrypt_for_user", &["p", "s", "extra"]));
        assert!(!fake.called_with("encrypt", &["p"]));
    }

    #[test]
    fn clear_calls_keeps_issued_tokens() {
        let fake = FakeEncryptionHelper::new();
        let token = fake.encrypt("kept").unwrap();
        fake.clear_calls();

        assert!(fake.received_calls().is_empty());
        assert_eq!(fake.decrypt(&token).unwrap(), "kept");
        assert_eq!(fake.encrypt("next").unwrap(), "enc-1");
    }

    #[test]
    fn received_calls_are_ordered() {
        let fake = FakeEncryptionHelper::new();
        fake.encrypt("one").unwrap();
        fake.decrypt("enc-0").unwrap();

        assert_eq!(
            fake.received_calls(),
            vec![Call::new("encrypt", &["one"]), Call::new("decrypt", &["enc-0"])]
        );
    }

    #[test]
    fn shared_across_threads() {
        let fake = Arc::new(FakeEncryptionHelper::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fake = Arc::clone(&fake);
                thread::spawn(move || {
                    let plaintext = format!("value-{i}");
                    let token = fake.encrypt(&plaintext).unwrap();
                    assert_eq!(fake.decrypt(&token).unwrap(), plaintext);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut tokens = fake.issued_tokens();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 8);
        assert_eq!(fake.call_count("encrypt"), 8);
    }
}
