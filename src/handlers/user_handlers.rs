use std::collections::HashMap;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::roles::{ALL_ROLES, Role};
use crate::auth::session::{RequestContext, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::redirect;
use crate::models::query_filter::SelectOption;
use crate::models::user::{self, STATUS_ACTIVE, STATUS_INACTIVE, User, UserAdminForm, UserFilter};
use crate::templates_structs::{PageContext, UserFormTemplate, UserListTemplate};

const STATUSES: [(&str, &str); 2] = [(STATUS_ACTIVE, "Active"), (STATUS_INACTIVE, "Inactive")];

fn role_options(blank: Option<&'static str>, current: &str) -> Vec<SelectOption> {
    let mut options = match blank {
        Some(label) => SelectOption::list([("", label)], current),
        None => vec![],
    };
    options.extend(SelectOption::list(ALL_ROLES.iter().map(|r| (r.as_str(), r.label())), current));
    options
}

fn status_options(blank: Option<&'static str>, current: &str) -> Vec<SelectOption> {
    let mut options = match blank {
        Some(label) => SelectOption::list([("", label)], current),
        None => vec![],
    };
    options.extend(SelectOption::list(STATUSES, current));
    options
}

/// Rules for an admin changing another account's role and status.
pub fn check_admin_change(
    rc: &RequestContext,
    target: &User,
    new_role: Role,
    new_status: &str,
) -> Result<(), String> {
    if new_status != STATUS_ACTIVE && new_status != STATUS_INACTIVE {
        return Err("Status must be Active or Inactive".to_string());
    }
    let touches_super_admin = new_role == Role::SuperAdmin || target.role() == Role::SuperAdmin;
    if touches_super_admin && new_role != target.role() && !rc.has_permission("manage", "super_admin") {
        return Err("Only a super admin can grant or revoke the super admin role".to_string());
    }
    if target.role() == Role::SuperAdmin && !rc.has_permission("manage", "super_admin") {
        return Err("Only a super admin can change a super admin account".to_string());
    }
    if target.id == rc.user_id && new_status == STATUS_INACTIVE {
        return Err("You cannot deactivate your own account".to_string());
    }
    Ok(())
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    rc.require("read", "users")?;
    let filter = UserFilter::from_query(&query);
    let users = user::find_filtered(&pool, &filter).await?;

    let ctx = PageContext::for_user(&session, &pool, &rc, "/admin/users").await;
    render(UserListTemplate {
        ctx,
        users,
        role_filter: role_options(Some("All roles"), filter.role.as_deref().unwrap_or("")),
        status_filter: status_options(Some("All statuses"), filter.status.as_deref().unwrap_or("")),
        search: filter.search.clone().unwrap_or_default(),
        can_edit: rc.has_permission("update", "users"),
    })
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    rc: &RequestContext,
    target: User,
    role: &str,
    status: &str,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::for_user(session, pool, rc, "/admin/users").await;
    render(UserFormTemplate {
        ctx,
        role_options: role_options(None, role),
        status_options: status_options(None, status),
        user: target,
        errors,
    })
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "users")?;
    let target = user::find_by_id(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    let (role, status) = (target.role.clone(), target.status.clone());
    render_form(&pool, &session, &rc, target, &role, &status, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    rc: RequestContext,
    path: web::Path<i64>,
    form: web::Form<UserAdminForm>,
) -> Result<HttpResponse, AppError> {
    rc.require("update", "users")?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let id = path.into_inner();
    let target = user::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    let check = form
        .role
        .parse::<Role>()
        .map_err(|_| "Please choose a valid role".to_string())
        .and_then(|role| check_admin_change(&rc, &target, role, form.status.trim()).map(|_| role));

    let new_role = match check {
        Ok(role) => role,
        Err(msg) => {
            log::warn!("User {} refused change to user {id}: {msg}", rc.user_id);
            return render_form(&pool, &session, &rc, target, &form.role, &form.status, vec![msg]).await;
        }
    };

    user::update_role_status(&pool, id, new_role, form.status.trim()).await?;
    log::info!(
        "User {} set user {id} to role {new_role}, status {}",
        rc.user_id,
        form.status.trim()
    );
    set_flash(&session, "User updated");
    Ok(redirect("/admin/users"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Permissions;
    use chrono::Utc;

    fn ctx(user_id: i64, role: Role) -> RequestContext {
        RequestContext {
            user_id,
            username: "actor".into(),
            role,
            permissions: Permissions::for_role(role),
            theme_mode: "auto".into(),
            primary_color: "#1d4ed8".into(),
        }
    }

    fn target(id: i64, role: Role) -> User {
        User {
            id,
            username: "target".into(),
            email: None,
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            role: role.as_str().into(),
            status: STATUS_ACTIVE.into(),
            oauth_provider: None,
            oauth_id: None,
            profile_picture: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_cannot_grant_or_revoke_super_admin() {
        let admin = ctx(1, Role::Admin);
        assert!(check_admin_change(&admin, &target(2, Role::User), Role::SuperAdmin, STATUS_ACTIVE).is_err());
        assert!(check_admin_change(&admin, &target(2, Role::SuperAdmin), Role::User, STATUS_ACTIVE).is_err());
        assert!(check_admin_change(&admin, &target(2, Role::User), Role::Member, STATUS_ACTIVE).is_ok());
    }

    #[test]
    fn super_admin_can_grant_super_admin() {
        let sa = ctx(1, Role::SuperAdmin);
        assert!(check_admin_change(&sa, &target(2, Role::Admin), Role::SuperAdmin, STATUS_ACTIVE).is_ok());
    }

    #[test]
    fn nobody_deactivates_themselves() {
        let sa = ctx(1, Role::SuperAdmin);
        let err = check_admin_change(&sa, &target(1, Role::SuperAdmin), Role::SuperAdmin, STATUS_INACTIVE);
        assert_eq!(err, Err("You cannot deactivate your own account".to_string()));
    }

    #[test]
    fn unknown_status_rejected() {
        let admin = ctx(1, Role::Admin);
        assert!(check_admin_change(&admin, &target(2, Role::User), Role::User, "Banned").is_err());
    }
}
