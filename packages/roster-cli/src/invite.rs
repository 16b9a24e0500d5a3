//! Membership invitations: drive the People settings surface to add
//! synthetic members.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Domains for disposable invite addresses.
const DOMAINS: [&str; 3] = ["example.com", "test.com", "demo.com"];
const LOCAL_PART_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LOCAL_PART_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum InviteError {
    /// A UI gesture failed. Not retried; remaining invitations are
    /// abandoned.
    #[error("invite gesture '{gesture}' failed: {source}")]
    Ui {
        gesture: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The add-member gestures, separated from the browser for testability.
#[async_trait]
pub trait InviteSurface {
    /// Navigate to Settings -> People. Done once per run.
    async fn open_member_settings(&self) -> Result<(), InviteError>;

    /// Open the "Add members" dialog.
    async fn open_invite_dialog(&self) -> Result<(), InviteError>;

    /// Fill the address and commit it as a recipient token.
    async fn enter_recipient(&self, address: &str) -> Result<(), InviteError>;

    async fn submit_invite(&self) -> Result<(), InviteError>;

    /// Give the client-side UI time to re-render after a submission.
    async fn settle(&self);
}

/// Send `count` invitations, one full gesture sequence each.
///
/// Fire-and-forget: nothing reads the member list back afterwards, and a
/// failed gesture aborts the remaining iterations.
pub async fn run<S>(surface: &S, count: usize) -> Result<(), InviteError>
where
    S: InviteSurface + Sync,
{
    if count == 0 {
        return Ok(());
    }

    surface.open_member_settings().await?;
    for sent in 0..count {
        let address = synthetic_address();
        tracing::info!(address = %address, sent, count, "sending invitation");
        surface.open_invite_dialog().await?;
        surface.enter_recipient(&address).await?;
        surface.submit_invite().await?;
        surface.settle().await;
    }
    Ok(())
}

/// A disposable, syntactically valid address: ten lowercase-alphanumeric
/// characters at one of the fixed test domains.
pub fn synthetic_address() -> String {
    let mut rng = rand::thread_rng();
    let local: String = (0..LOCAL_PART_LEN)
        .map(|_| LOCAL_PART_CHARS[rng.gen_range(0..LOCAL_PART_CHARS.len())] as char)
        .collect();
    let domain = DOMAINS.choose(&mut rng).unwrap_or(&DOMAINS[0]);
    format!("{local}@{domain}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn is_synthetic(address: &str) -> bool {
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        local.len() == LOCAL_PART_LEN
            && local
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && DOMAINS.contains(&domain)
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Gesture {
        OpenSettings,
        OpenDialog,
        Enter(String),
        Submit,
    }

    /// Scripted invite surface that records every gesture.
    #[derive(Default)]
    struct MockSurface {
        gestures: Mutex<Vec<Gesture>>,
        fail_on_dialog: Option<usize>,
    }

    impl MockSurface {
        fn gestures(&self) -> Vec<Gesture> {
            self.gestures.lock().unwrap().clone()
        }

        fn dialogs_opened(&self) -> usize {
            self.gestures()
                .iter()
                .filter(|g| **g == Gesture::OpenDialog)
                .count()
        }
    }

    #[async_trait]
    impl InviteSurface for MockSurface {
        async fn open_member_settings(&self) -> Result<(), InviteError> {
            self.gestures.lock().unwrap().push(Gesture::OpenSettings);
            Ok(())
        }

        async fn open_invite_dialog(&self) -> Result<(), InviteError> {
            let opened = self.dialogs_opened() + 1;
            self.gestures.lock().unwrap().push(Gesture::OpenDialog);
            if self.fail_on_dialog == Some(opened) {
                return Err(InviteError::Ui {
                    gesture: "open invite dialog",
                    source: "dialog never rendered".into(),
                });
            }
            Ok(())
        }

        async fn enter_recipient(&self, address: &str) -> Result<(), InviteError> {
            self.gestures
                .lock()
                .unwrap()
                .push(Gesture::Enter(address.to_string()));
            Ok(())
        }

        async fn submit_invite(&self) -> Result<(), InviteError> {
            self.gestures.lock().unwrap().push(Gesture::Submit);
            Ok(())
        }

        async fn settle(&self) {}
    }

    #[test]
    fn synthetic_addresses_match_the_fixed_shape() {
        for _ in 0..200 {
            let address = synthetic_address();
            assert!(is_synthetic(&address), "bad address: {address}");
        }
    }

    #[tokio::test]
    async fn two_invites_run_two_full_sequences_with_distinct_addresses() {
        let surface = MockSurface::default();

        run(&surface, 2).await.unwrap();

        let gestures = surface.gestures();
        assert_eq!(gestures[0], Gesture::OpenSettings);

        let addresses: Vec<String> = gestures
            .iter()
            .filter_map(|g| match g {
                Gesture::Enter(address) => Some(address.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(addresses.len(), 2);
        assert_ne!(addresses[0], addresses[1]);
        assert!(addresses.iter().all(|a| is_synthetic(a)));

        assert_eq!(surface.dialogs_opened(), 2);
        assert_eq!(
            gestures.iter().filter(|g| **g == Gesture::Submit).count(),
            2
        );
    }

    #[tokio::test]
    async fn zero_invites_touch_nothing() {
        let surface = MockSurface::default();

        run(&surface, 0).await.unwrap();

        assert!(surface.gestures().is_empty());
    }

    #[tokio::test]
    async fn failed_gesture_aborts_the_remaining_iterations() {
        let surface = MockSurface {
            fail_on_dialog: Some(2),
            ..Default::default()
        };

        let result = run(&surface, 3).await;

        assert!(result.is_err());
        let gestures = surface.gestures();
        // First invitation completed, second died opening its dialog.
        assert_eq!(
            gestures.iter().filter(|g| **g == Gesture::Submit).count(),
            1
        );
        assert_eq!(surface.dialogs_opened(), 2);
    }
}
