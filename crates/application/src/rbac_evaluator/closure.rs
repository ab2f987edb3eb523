use std::collections::HashSet;

use qryvanta_core::AppResult;
use qryvanta_domain::{Role, RoleId, MAX_HIERARCHY_DEPTH};

use super::ports::RbacRepository;

/// Computes the transitive closure of `root_role_ids` and their ancestors
/// via the parent pointer, bounded by [`MAX_HIERARCHY_DEPTH`] and cycle-safe
/// via a visited set, per §4.2 step 3.
pub async fn resolve_closure(
    repository: &dyn RbacRepository,
    root_role_ids: impl IntoIterator<Item = RoleId>,
) -> AppResult<Vec<Role>> {
    let mut visited: HashSet<RoleId> = HashSet::new();
    let mut closure = Vec::new();
    let mut frontier: Vec<RoleId> = root_role_ids.into_iter().collect();

    let mut depth = 0_u8;
    while !frontier.is_empty() && depth <= MAX_HIERARCHY_DEPTH {
        let mut next_frontier = Vec::new();

        for role_id in frontier {
            if !visited.insert(role_id) {
                continue;
            }

            let Some(role) = repository.find_role(role_id).await? else {
                continue;
            };

            if let Some(parent_id) = role.parent_id() {
                if !visited.contains(&parent_id) {
                    next_frontier.push(parent_id);
                }
            }

            closure.push(role);
        }

        frontier = next_frontier;
        depth += 1;
    }

    Ok(closure)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use parking_lot::Mutex;

    use async_trait::async_trait;
    use qryvanta_core::{AppResult, TenantId};
    use qryvanta_domain::{Permission, User, UserId, UserRole};

    use super::*;

    struct InMemoryRoles {
        roles: Mutex<HashMap<RoleId, Role>>,
    }

    #[async_trait]
    impl RbacRepository for InMemoryRoles {
        async fn find_user_by_external_id(
            &self,
            _tenant_id: TenantId,
            _external_id: &str,
        ) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn list_user_roles(&self, _user_id: UserId) -> AppResult<Vec<UserRole>> {
            Ok(Vec::new())
        }

        async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
            Ok(self.roles.lock().get(&role_id).cloned())
        }

        async fn list_role_permissions(&self, _role_id: RoleId) -> AppResult<Vec<Permission>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn closure_includes_ancestors() {
        let org_id = TenantId::new();
        let admin = Role::root(RoleId::new(), org_id, "admin", "Admin", false).unwrap_or_else(|_| unreachable!());
        let viewer = Role::child_of(RoleId::new(), org_id, "viewer", "Viewer", &admin, false)
            .unwrap_or_else(|_| unreachable!());

        let mut roles = HashMap::new();
        roles.insert(admin.id(), admin.clone());
        roles.insert(viewer.id(), viewer.clone());
        let repository = InMemoryRoles {
            roles: Mutex::new(roles),
        };

        let closure = resolve_closure(&repository, [viewer.id()])
            .await
            .unwrap_or_else(|_| unreachable!());
        let ids: HashSet<RoleId> = closure.iter().map(Role::id).collect();
        assert!(ids.contains(&viewer.id()));
        assert!(ids.contains(&admin.id()));
    }

    #[tokio::test]
    async fn closure_is_cycle_safe() {
        // A role that (incorrectly) points to itself as parent must not
        // cause an infinite loop; closure resolution still terminates.
        let org_id = TenantId::new();
        let role_id = RoleId::new();
        let role = Role::from_parts(
            role_id,
            org_id,
            "self-parented".to_owned(),
            "Self Parented".to_owned(),
            Some(role_id),
            0,
            false,
        );
        let mut roles = HashMap::new();
        roles.insert(role_id, role);
        let repository = InMemoryRoles {
            roles: Mutex::new(roles),
        };

        let closure = resolve_closure(&repository, [role_id])
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(closure.len(), 1);
    }
}
