use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::cache::SessionUser;
use crate::database::models::{
    NewUser, USER_TYPE_GITHUB, USER_TYPE_LOCAL, User, UserColumn, UserPatch, UserRecord,
};
use crate::database::query::{ListParams, ListQuery, project};
use crate::error::AppError;
use crate::utils::{hash_password, verify_password};

/// 登录请求，`name` 也可以填写邮箱，缺省字段为空串
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// GitHub 回调带回的授权码
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GithubLoginRequest {
    pub code: String,
    pub state: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            user_id: user.id,
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// 注册本地用户，新用户不是管理员
pub async fn register(state: &AppState, req: NewUser) -> Result<User, AppError> {
    if req.name.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidRequest(
            "name and password are required".to_string(),
        ));
    }

    let record = UserRecord {
        password_hash: Some(hash_password(&req.password)?),
        name: req.name,
        nick: req.nick,
        email: req.email,
        avatar_url: req.avatar_url,
        user_type: USER_TYPE_LOCAL,
        foreign_id: None,
        is_admin: false,
    };
    state.users.create(record).await
}

pub async fn update(state: &AppState, id: i64, mut patch: UserPatch) -> Result<User, AppError> {
    if let Some(password) = patch.password.take() {
        patch.password = Some(hash_password(&password)?);
    }
    state.users.update(id, patch).await
}

pub async fn list(state: &AppState, params: &ListParams) -> Result<Vec<Value>, AppError> {
    let query = ListQuery::<UserColumn>::from_params(params)?;
    let users = state.users.list(&query).await?;
    project(users, &query.fields)
}

/// 按用户名查找，找不到再按邮箱查找
async fn find_login_user(state: &AppState, name: &str) -> Result<User, AppError> {
    // 第三方账户的邮箱可能为空，空名字不参与查找
    if name.trim().is_empty() {
        return Err(AppError::UserNotExist);
    }
    match state.users.find_by_name(name).await {
        Err(e) if e.is_not_found() => {}
        other => return other,
    }
    match state.users.find_by_email(name).await {
        Err(e) if e.is_not_found() => Err(AppError::UserNotExist),
        other => other,
    }
}

/// 校验密码，第三方账户没有本地密码
pub async fn authenticate(state: &AppState, req: &LoginRequest) -> Result<User, AppError> {
    let user = find_login_user(state, &req.name).await?;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::PasswordError);
    };
    if !verify_password(&req.password, hash)? {
        return Err(AppError::PasswordError);
    }
    Ok(user)
}

/// 用授权码换取 GitHub 资料，首次登录时创建本地账户
pub async fn github_user(state: &AppState, req: &GithubLoginRequest) -> Result<User, AppError> {
    let token = state.github.exchange_code(&req.code, &req.state).await?;
    let profile = state.github.fetch_user(&token).await?;
    let foreign_id = profile.foreign_id();

    match state.users.find_by_foreign_id(&foreign_id).await {
        Err(e) if e.is_not_found() => {}
        other => return other,
    }

    tracing::info!("Creating account for {}", foreign_id);
    let mut record = UserRecord {
        name: profile.login.clone(),
        nick: profile.display_name().to_string(),
        password_hash: None,
        email: profile.email.clone().unwrap_or_default(),
        avatar_url: profile.avatar_url.clone(),
        user_type: USER_TYPE_GITHUB,
        foreign_id: Some(foreign_id.clone()),
        is_admin: false,
    };
    match state.users.create(record.clone()).await {
        Err(AppError::Duplicate(_)) => {}
        other => return other,
    }

    // 登录名已被本地账户占用时带上外部标识
    record.name = format!("{}-{}", profile.login, foreign_id);
    tracing::info!("Name {} taken, creating {} instead", profile.login, record.name);
    match state.users.create(record).await {
        // 同一账号并发首次登录，另一个请求已经建好
        Err(AppError::Duplicate(_)) => state.users.find_by_foreign_id(&foreign_id).await,
        other => other,
    }
}

/// 建立会话并把令牌附在用户上返回
pub async fn start_session(state: &AppState, mut user: User) -> Result<User, AppError> {
    let token = state.sessions.create(&SessionUser::from(&user)).await?;
    tracing::info!("User {} logged in", user.id);
    user.token = Some(token);
    Ok(user)
}
