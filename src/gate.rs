// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, fmt};

use log::debug;

use crate::{
    route::{RouteDeclaration, Router},
    session::Session,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::RedirectToLogin => "redirect to login",
            Self::RedirectToHome => "redirect to home",
        })
    }
}

// The situations a navigation can be in. Every one maps to exactly one
// decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Access {
    Public,
    Unauthenticated,
    Authenticated,
    RoleMatched,
    RoleMismatched,
}

fn classify(declaration: &RouteDeclaration, session: &Session) -> Access {
    if declaration.public {
        return Access::Public;
    }
    if !session.is_authenticated() {
        return Access::Unauthenticated;
    }
    match (declaration.required_role.as_deref(), session.user()) {
        (None, _) => Access::Authenticated,
        (Some(role), Some(user)) if user.role == role => Access::RoleMatched,
        // A session with a token but no readable profile cannot prove its role.
        (Some(_), Some(_) | None) => Access::RoleMismatched,
    }
}

pub(crate) fn decide(declaration: &RouteDeclaration, session: &Session) -> Decision {
    match classify(declaration, session) {
        Access::Public | Access::Authenticated | Access::RoleMatched => Decision::Allow,
        Access::Unauthenticated => Decision::RedirectToLogin,
        Access::RoleMismatched => Decision::RedirectToHome,
    }
}

/// The outcome of one navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Navigation {
    pub(crate) path: String,
    pub(crate) route: Option<String>,
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) decision: Decision,
}

/// Decides whether navigations may proceed. It only ever reads the session it
/// is handed.
pub(crate) struct Gate {
    router: Router,
    login: String,
    home: String,
}

impl Gate {
    pub(crate) fn new(router: Router) -> Self {
        Self {
            router,
            login: "/login".to_owned(),
            home: "/".to_owned(),
        }
    }

    pub(crate) fn with_home(mut self, home: &str) -> Self {
        self.home = home.to_owned();
        self
    }

    #[cfg(test)]
    pub(crate) fn with_login(mut self, login: &str) -> Self {
        self.login = login.to_owned();
        self
    }

    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }

    /// Where a decision sends the user, if anywhere.
    pub(crate) fn location(&self, decision: Decision) -> Option<&str> {
        match decision {
            Decision::Allow => None,
            Decision::RedirectToLogin => Some(self.login.as_str()),
            Decision::RedirectToHome => Some(self.home.as_str()),
        }
    }

    pub(crate) fn navigate(&self, path: &str, session: &Session) -> Navigation {
        let resolution = self.router.resolve(path);
        let decision = decide(&resolution.declaration(), session);
        debug!(
            "Navigation to {} ({}): {}",
            resolution.path(),
            resolution.name().unwrap_or("unmatched"),
            decision
        );
        Navigation {
            path: resolution.path().to_owned(),
            route: resolution.name().map(str::to_owned),
            decision,
            params: resolution.into_params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures_util::lock::Mutex;
    use secrecy::SecretString;
    use serde_json::Value;

    use crate::{
        api::{Request, Transport, UserRecord},
        error::{Error, Result},
        route::Route,
        session::Manager,
        storage::{self, Slot, Storage as _},
    };

    use super::*;

    fn signed_in(role: &str) -> Session {
        Session::authenticated(
            SecretString::new("t1".to_owned()),
            SecretString::new("t2".to_owned()),
            UserRecord::with_role(role),
        )
    }

    fn sessions() -> Vec<Session> {
        vec![Session::default(), signed_in("teacher"), signed_in("principal")]
    }

    fn gate() -> Gate {
        Gate::new(Router::new(vec![
            Route::new("/public").public(),
            Route::new("/dash"),
            Route::new("/admin").role("principal"),
        ]))
    }

    #[test]
    fn public_routes_always_allow() {
        for session in sessions() {
            assert_eq!(decide(&RouteDeclaration::public(), &session), Decision::Allow);
            let mut declaration = RouteDeclaration::for_role("finance");
            declaration.public = true;
            assert_eq!(decide(&declaration, &session), Decision::Allow);
        }
    }

    #[test]
    fn protected_routes_need_a_session() {
        let anonymous = Session::default();
        for declaration in [
            RouteDeclaration::protected(),
            RouteDeclaration::for_role("teacher"),
            RouteDeclaration::for_role("principal"),
        ] {
            assert_eq!(decide(&declaration, &anonymous), Decision::RedirectToLogin);
        }
    }

    #[test]
    fn roles_must_match_exactly() {
        let teacher = signed_in("teacher");
        assert_eq!(
            decide(&RouteDeclaration::for_role("teacher"), &teacher),
            Decision::Allow
        );
        assert_eq!(
            decide(&RouteDeclaration::for_role("principal"), &teacher),
            Decision::RedirectToHome
        );
        assert_eq!(
            decide(&RouteDeclaration::for_role("Teacher"), &teacher),
            Decision::RedirectToHome
        );
        assert_eq!(decide(&RouteDeclaration::protected(), &teacher), Decision::Allow);
    }

    #[tokio::test]
    async fn token_without_profile_fails_role_checks_only() -> Result<()> {
        let mut storage = storage::Memory::new();
        storage.update(Slot::AccessToken, "t1").await?;
        let manager = Manager::new(Arc::new(Mutex::new(storage)), Arc::new(Offline));

        let session = manager.session().await;

        assert!(session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(decide(&RouteDeclaration::protected(), &session), Decision::Allow);
        assert_eq!(
            decide(&RouteDeclaration::for_role("teacher"), &session),
            Decision::RedirectToHome
        );
        Ok(())
    }

    /// Replays canned response bodies in order.
    struct Canned(std::sync::Mutex<Vec<Value>>);

    impl Canned {
        fn new(mut bodies: Vec<Value>) -> Self {
            bodies.reverse();
            Self(std::sync::Mutex::new(bodies))
        }
    }

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn send(&self, _: Request) -> Result<Value> {
            Err(Error::Command)
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, _: Request) -> Result<Value> {
            self.0
                .lock()
                .ok()
                .and_then(|mut bodies| bodies.pop())
                .ok_or(Error::Command)
        }
    }

    #[tokio::test]
    async fn navigation_follows_login_and_logout() -> Result<()> {
        let gate = gate();
        let manager = Manager::new(
            Arc::new(Mutex::new(storage::Memory::new())),
            Arc::new(Canned::new(vec![
                serde_json::json!({"access": "t1", "refresh": "t2"}),
                serde_json::json!({"role": "teacher"}),
            ])),
        );

        let user = manager
            .login("a@b.com", &SecretString::new("pw".to_owned()))
            .await?;
        assert_eq!(user.role, "teacher");

        let session = manager.session().await;
        assert_eq!(gate.navigate("/public", &session).decision, Decision::Allow);
        assert_eq!(gate.navigate("/dash", &session).decision, Decision::Allow);
        assert_eq!(gate.navigate("/admin", &session).decision, Decision::RedirectToHome);

        manager.logout().await;
        let session = manager.session().await;
        assert_eq!(gate.navigate("/dash", &session).decision, Decision::RedirectToLogin);
        assert_eq!(gate.navigate("/admin", &session).decision, Decision::RedirectToLogin);
        Ok(())
    }

    #[test]
    fn navigation_scenario() {
        let gate = gate();
        let anonymous = Session::default();
        assert_eq!(gate.navigate("/public", &anonymous).decision, Decision::Allow);
        assert_eq!(gate.navigate("/dash", &anonymous).decision, Decision::RedirectToLogin);
        assert_eq!(gate.navigate("/admin", &anonymous).decision, Decision::RedirectToLogin);

        let teacher = signed_in("teacher");
        assert_eq!(gate.navigate("/dash", &teacher).decision, Decision::Allow);
        assert_eq!(gate.navigate("/admin", &teacher).decision, Decision::RedirectToHome);

        let principal = signed_in("principal");
        assert_eq!(gate.navigate("/admin", &principal).decision, Decision::Allow);
    }

    #[test]
    fn unknown_routes_are_treated_as_protected() {
        let gate = gate();
        let navigation = gate.navigate("/missing", &Session::default());
        assert_eq!(navigation.route, None);
        assert_eq!(navigation.decision, Decision::RedirectToLogin);
        assert_eq!(gate.navigate("/missing", &signed_in("parent")).decision, Decision::Allow);
    }

    #[test]
    fn each_decision_has_one_location() {
        let gate = gate().with_login("/signin").with_home("/portals");
        assert_eq!(gate.location(Decision::Allow), None);
        assert_eq!(gate.location(Decision::RedirectToLogin), Some("/signin"));
        assert_eq!(gate.location(Decision::RedirectToHome), Some("/portals"));
    }
}
