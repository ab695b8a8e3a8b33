/**
 * Admin Handlers
 *
 * GET    /api/auth/admin/users           - filtered, paginated listing
 * DELETE /api/auth/admin/users/{user_id} - delete any non-admin account
 *
 * Both require the admin role. Admins cannot delete other admins or
 * themselves through these endpoints.
 */

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::auth::handlers::types::{
    ApiResponse, ListUsersQuery, Pagination, UserListData, UserResponse,
};
use crate::auth::store::{self, UserFilter};
use crate::auth::users::{authorize, Role};
use crate::error::AuthError;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListData>>, AuthError> {
    authorize(&user, &[Role::Admin])?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let filter = UserFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        role: query.role,
        is_active: query.is_active,
        is_email_verified: query.is_email_verified,
    };

    let users = store::list_users(&state.pool, &filter, limit, offset).await?;
    let total = store::count_users(&state.pool, &filter).await?;
    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    let data = UserListData {
        users: users.iter().map(UserResponse::from).collect(),
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_users: total,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        },
    };

    Ok(Json(ApiResponse::with_data("Users", data)))
}

pub async fn admin_delete_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse>, AuthError> {
    authorize(&admin, &[Role::Admin])?;

    let target = store::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AuthError::not_found("User not found"))?;

    if target.id == admin.id {
        return Err(AuthError::authorization("Cannot delete your own account"));
    }
    if target.role == Role::Admin {
        return Err(AuthError::authorization(
            "Cannot delete another admin account",
        ));
    }

    store::delete_user(&state.pool, target.id).await?;

    tracing::info!(admin = %admin.name, target = %target.name, "user deleted by admin");
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
