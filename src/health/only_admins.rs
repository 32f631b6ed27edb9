//! Flags installations where every active account is an administrator

use super::{CheckResult, HealthCheck, HealthResult};
use crate::access::{Permission, UserDirectory};

pub struct OnlyAdminsCheck<D> {
    directory: D,
}

impl<D: UserDirectory> OnlyAdminsCheck<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }
}

impl<D: UserDirectory> HealthCheck for OnlyAdminsCheck<D> {
    fn key(&self) -> &'static str {
        "only_admins"
    }

    // Nothing is cached, so `force` changes nothing.
    fn perform_check(&self, _force: bool) -> anyhow::Result<CheckResult> {
        let users = self.directory.all_users()?;
        let non_admins = users
            .iter()
            .filter(|user| user.is_active() && !user.has_permission(Permission::Admin))
            .count();

        Ok(CheckResult::new(if non_admins == 0 {
            HealthResult::Info
        } else {
            HealthResult::Ok
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::UserAccount;

    struct Unreachable;

    impl UserDirectory for Unreachable {
        fn all_users(&self) -> anyhow::Result<Vec<UserAccount>> {
            anyhow::bail!("user manager not initialized")
        }
    }

    fn admin(name: &str) -> UserAccount {
        UserAccount::new(name, true, vec![Permission::Admin])
    }

    fn user(name: &str, active: bool) -> UserAccount {
        UserAccount::new(name, active, vec![Permission::Status, Permission::Print])
    }

    #[test]
    fn test_only_admins_is_info() {
        let check = OnlyAdminsCheck::new(vec![admin("root"), admin("ops")]);

        let result = check.perform_check(false).unwrap();
        assert_eq!(result.result, HealthResult::Info);
        assert!(result.context.is_empty());
    }

    #[test]
    fn test_active_non_admin_is_ok() {
        let check = OnlyAdminsCheck::new(vec![admin("root"), user("printer", true)]);

        assert_eq!(check.perform_check(false).unwrap().result, HealthResult::Ok);
    }

    #[test]
    fn test_inactive_non_admins_are_ignored() {
        let check = OnlyAdminsCheck::new(vec![admin("root"), user("old", false)]);

        assert_eq!(check.perform_check(true).unwrap().result, HealthResult::Info);
    }

    #[test]
    fn test_no_users_is_info() {
        let check = OnlyAdminsCheck::new(Vec::<UserAccount>::new());

        assert_eq!(check.perform_check(false).unwrap().result, HealthResult::Info);
    }

    #[test]
    fn test_directory_errors_propagate() {
        let check = OnlyAdminsCheck::new(Unreachable);

        let err = check.perform_check(false).unwrap_err();
        assert_eq!(err.to_string(), "user manager not initialized");
    }
}
