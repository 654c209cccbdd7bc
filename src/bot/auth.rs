//! Session authentication state machine
//!
//! The gate runs for every inbound message before any other handler and
//! either consumes the update (greeting, login flow, "not authenticated"
//! prompt) or forwards it to the router. The transition itself is a pure
//! function over the session; the network login sits behind the
//! [`LoginService`] seam.

use crate::api::LoginService;
use crate::bot::session::{AuthStep, Session, SessionStore};
use crate::i18n::Text;
use teloxide::types::ChatId;
use tracing::warn;

/// Command that (re)starts the login flow
pub const LOGIN_COMMAND: &str = "/login";

/// What the gate decided to do with an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// First contact: send the welcome message and consume the update
    Greet,
    /// Send a prompt and consume the update
    Prompt(Text),
    /// Credentials are complete: perform the login call
    Login {
        /// Email captured in the previous step
        email: String,
        /// Password from the current message
        password: String,
    },
    /// Pass the update through to the command router
    Forward,
}

/// Advances the state machine for one inbound message.
///
/// Consumes the first message of a chat with a greeting, walks the
/// email/password steps while unauthenticated, and forwards everything
/// once authenticated. `/login` is always forwarded so the router can
/// (re)start the flow, overwriting any step in progress.
pub fn advance(session: &mut Session, text: Option<&str>) -> GateOutcome {
    if !session.greeted {
        session.greeted = true;
        return GateOutcome::Greet;
    }
    if session.authenticated {
        return GateOutcome::Forward;
    }
    if is_login_command(text) {
        return GateOutcome::Forward;
    }

    match (session.step, text) {
        (AuthStep::AwaitingEmail, Some(email)) => {
            // Accepted verbatim; the backend is the validator.
            session.email = Some(email.to_string());
            session.step = AuthStep::AwaitingPassword;
            GateOutcome::Prompt(Text::EnterPassword)
        }
        (AuthStep::AwaitingPassword, Some(password)) => {
            let email = session.email.take().unwrap_or_default();
            session.step = AuthStep::None;
            GateOutcome::Login {
                email,
                password: password.to_string(),
            }
        }
        _ => GateOutcome::Prompt(Text::NotAuthenticated),
    }
}

/// Matches `/login` including the `@BotName` group-chat form.
fn is_login_command(text: Option<&str>) -> bool {
    text.and_then(|t| t.split_whitespace().next())
        .and_then(|c| c.split('@').next())
        == Some(LOGIN_COMMAND)
}

/// Runs the login call and settles the session, returning the message key
/// to send. Every failure is swallowed here: the user is reprompted, the
/// error never reaches the caller.
pub async fn resolve_login<S>(
    sessions: &SessionStore,
    service: &S,
    chat_id: ChatId,
    email: &str,
    password: &str,
) -> Text
where
    S: LoginService + ?Sized,
{
    match service.login(email, password).await {
        Ok(user) => {
            sessions.with(chat_id, |s| s.apply_login(user)).await;
            Text::LoginOk
        }
        Err(e) => {
            warn!("login failed for chat {chat_id}: {e}");
            sessions.with(chat_id, Session::reject_login).await;
            Text::InvalidCredentials
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Role, UserProfile};
    use async_trait::async_trait;

    struct StubLogin {
        accept: bool,
    }

    #[async_trait]
    impl LoginService for StubLogin {
        async fn login(&self, _email: &str, _password: &str) -> Result<UserProfile, ApiError> {
            if self.accept {
                Ok(UserProfile {
                    id: 7,
                    role: Role::User,
                })
            } else {
                Err(ApiError::Api("401 - bad credentials".to_string()))
            }
        }
    }

    fn greeted_session() -> Session {
        Session {
            greeted: true,
            ..Session::default()
        }
    }

    #[test]
    fn test_first_message_is_consumed_by_greeting() {
        let mut session = Session::default();
        assert_eq!(advance(&mut session, Some("/actions")), GateOutcome::Greet);
        assert!(session.greeted);
        // Only `greeted` changes on first contact.
        assert_eq!(session.step, AuthStep::None);
        assert!(!session.authenticated);
    }

    #[test]
    fn test_unauthenticated_input_is_blocked() {
        let mut session = greeted_session();
        let outcome = advance(&mut session, Some("show my tickets"));
        assert_eq!(outcome, GateOutcome::Prompt(Text::NotAuthenticated));
        assert_eq!(session.step, AuthStep::None);
        assert!(session.email.is_none());
    }

    #[test]
    fn test_login_command_is_forwarded_mid_step() {
        let mut session = greeted_session();
        session.step = AuthStep::AwaitingEmail;
        assert_eq!(
            advance(&mut session, Some(LOGIN_COMMAND)),
            GateOutcome::Forward
        );
        assert_eq!(
            advance(&mut session, Some("/login@HelpdeskBot")),
            GateOutcome::Forward
        );
    }

    #[test]
    fn test_email_step_accepts_anything_verbatim() {
        let mut session = greeted_session();
        session.step = AuthStep::AwaitingEmail;
        let outcome = advance(&mut session, Some("not an email at all"));
        assert_eq!(outcome, GateOutcome::Prompt(Text::EnterPassword));
        assert_eq!(session.step, AuthStep::AwaitingPassword);
        assert_eq!(session.email.as_deref(), Some("not an email at all"));
    }

    #[test]
    fn test_password_step_yields_login() {
        let mut session = greeted_session();
        session.step = AuthStep::AwaitingPassword;
        session.email = Some("user@example.com".to_string());
        let outcome = advance(&mut session, Some("hunter2"));
        assert_eq!(
            outcome,
            GateOutcome::Login {
                email: "user@example.com".to_string(),
                password: "hunter2".to_string(),
            }
        );
    }

    #[test]
    fn test_authenticated_traffic_is_forwarded() {
        let mut session = greeted_session();
        session.authenticated = true;
        assert_eq!(advance(&mut session, Some("anything")), GateOutcome::Forward);
        assert_eq!(advance(&mut session, None), GateOutcome::Forward);
    }

    #[tokio::test]
    async fn test_successful_login_authenticates_session() {
        let sessions = SessionStore::new();
        let chat = ChatId(1);
        sessions
            .with(chat, |s| {
                s.greeted = true;
                s.step = AuthStep::AwaitingPassword;
            })
            .await;

        let reply = resolve_login(&sessions, &StubLogin { accept: true }, chat, "e", "p").await;
        assert_eq!(reply, Text::LoginOk);

        let session = sessions.snapshot(chat).await;
        assert!(session.authenticated);
        assert_eq!(session.step, AuthStep::None);
        assert_eq!(session.user.map(|u| u.id), Some(7));
    }

    #[tokio::test]
    async fn test_failed_login_resets_flow_and_is_swallowed() {
        let sessions = SessionStore::new();
        let chat = ChatId(1);
        sessions
            .with(chat, |s| {
                s.greeted = true;
                s.step = AuthStep::AwaitingPassword;
                s.email = Some("e".to_string());
            })
            .await;

        let reply = resolve_login(&sessions, &StubLogin { accept: false }, chat, "e", "p").await;
        assert_eq!(reply, Text::InvalidCredentials);

        let session = sessions.snapshot(chat).await;
        assert!(!session.authenticated);
        assert_eq!(session.step, AuthStep::None);
        assert!(session.email.is_none());
    }
}
