//! Row-level access predicates.
//!
//! Each submodule mirrors one table. Services evaluate the predicate before touching the
//! database and answer `Forbidden` when it fails. The database itself runs with root
//! credentials, so these functions are the only access control on rows.

use crate::security::Actor;

/// `profile` rows.
pub mod profile {
    use super::Actor;

    /// Owners read their own profile; professors and admins read everyone's.
    #[must_use]
    pub fn can_select(actor: &Actor, owner_id: &str) -> bool {
        actor.is(owner_id) || actor.is_professor() || actor.is_admin()
    }

    #[must_use]
    pub fn can_update(actor: &Actor, owner_id: &str) -> bool {
        actor.is(owner_id)
    }
}

/// `user_role` rows.
pub mod user_role {
    use super::Actor;

    #[must_use]
    pub fn can_select(actor: &Actor, user_id: &str) -> bool {
        actor.is(user_id) || actor.is_admin()
    }

    #[must_use]
    pub fn can_grant(actor: &Actor) -> bool {
        actor.is_admin()
    }

    #[must_use]
    pub fn can_revoke(actor: &Actor) -> bool {
        actor.is_admin()
    }
}

/// `course` rows.
pub mod course {
    use super::Actor;

    /// Any authenticated caller; students resolve scanned courses.
    #[must_use]
    pub const fn can_select(_actor: &Actor) -> bool {
        true
    }

    /// Professors create courses they own.
    #[must_use]
    pub fn can_insert(actor: &Actor, professor_id: &str) -> bool {
        actor.is_professor() && actor.is(professor_id)
    }

    /// Update, delete, QR issue, roster and analytics access.
    #[must_use]
    pub fn can_manage(actor: &Actor, professor_id: &str) -> bool {
        actor.is(professor_id) || actor.is_admin()
    }
}

/// `attendance` rows.
pub mod attendance {
    use super::Actor;

    #[must_use]
    pub fn can_select(actor: &Actor, student_id: &str, course_owner_id: &str) -> bool {
        actor.is(student_id) || actor.is(course_owner_id) || actor.is_admin()
    }

    /// Students record their own check-ins only.
    #[must_use]
    pub fn can_insert(actor: &Actor, student_id: &str) -> bool {
        actor.is_student() && actor.is(student_id)
    }

    #[must_use]
    pub fn can_delete(actor: &Actor, course_owner_id: &str) -> bool {
        actor.is(course_owner_id) || actor.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roles::RoleSet;

    fn student() -> Actor {
        Actor::new("stu", "stu@uni.edu", RoleSet::STUDENT)
    }

    fn professor() -> Actor {
        Actor::new("prof", "prof@uni.edu", RoleSet::PROFESSOR)
    }

    fn admin() -> Actor {
        Actor::new("root", "root@uni.edu", RoleSet::ADMIN)
    }

    #[test]
    fn profiles_are_visible_to_owner_staff_and_admins() {
        assert!(profile::can_select(&student(), "stu"));
        assert!(!profile::can_select(&student(), "someone-else"));
        assert!(profile::can_select(&professor(), "stu"));
        assert!(profile::can_select(&admin(), "stu"));

        assert!(profile::can_update(&student(), "stu"));
        assert!(!profile::can_update(&admin(), "stu"));
    }

    #[test]
    fn roles_are_managed_by_admins_only() {
        assert!(user_role::can_select(&student(), "stu"));
        assert!(!user_role::can_select(&professor(), "stu"));
        assert!(user_role::can_select(&admin(), "stu"));

        assert!(!user_role::can_grant(&professor()));
        assert!(user_role::can_grant(&admin()));
        assert!(!user_role::can_revoke(&student()));
        assert!(user_role::can_revoke(&admin()));
    }

    #[test]
    fn courses_are_created_by_professors_for_themselves() {
        assert!(course::can_select(&student()));
        assert!(course::can_insert(&professor(), "prof"));
        assert!(!course::can_insert(&professor(), "other-prof"));
        assert!(!course::can_insert(&student(), "stu"));
        assert!(!course::can_insert(&admin(), "root"));
    }

    #[test]
    fn courses_are_managed_by_owner_or_admin() {
        assert!(course::can_manage(&professor(), "prof"));
        assert!(!course::can_manage(&professor(), "other-prof"));
        assert!(course::can_manage(&admin(), "other-prof"));
        assert!(!course::can_manage(&student(), "prof"));
    }

    #[test]
    fn attendance_rows_follow_student_and_course_owner() {
        assert!(attendance::can_select(&student(), "stu", "prof"));
        assert!(!attendance::can_select(&student(), "another-stu", "prof"));
        assert!(attendance::can_select(&professor(), "stu", "prof"));
        assert!(!attendance::can_select(&professor(), "stu", "other-prof"));
        assert!(attendance::can_select(&admin(), "stu", "prof"));

        assert!(attendance::can_insert(&student(), "stu"));
        assert!(!attendance::can_insert(&student(), "another-stu"));
        assert!(!attendance::can_insert(&professor(), "prof"));

        assert!(attendance::can_delete(&professor(), "prof"));
        assert!(!attendance::can_delete(&student(), "prof"));
        assert!(attendance::can_delete(&admin(), "prof"));
    }

    #[test]
    fn combined_roles_accumulate_rights() {
        let both = Actor::new("ta", "ta@uni.edu", RoleSet::STUDENT | RoleSet::PROFESSOR);
        assert!(attendance::can_insert(&both, "ta"));
        assert!(course::can_insert(&both, "ta"));
    }
}
