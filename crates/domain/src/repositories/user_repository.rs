//! 用户Repository接口定义

use async_trait::async_trait;

use crate::entities::user::User;
use crate::errors::RepositoryResult;
use crate::value_objects::{Handle, UserId};

/// 用户Repository接口
///
/// 用户记录由外部身份子系统写入，本核心只做查找。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户（身份子系统与测试使用）
    async fn create(&self, user: User) -> RepositoryResult<User>;

    /// 根据ID查找用户
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// 根据句柄精确查找用户
    async fn find_by_handle(&self, handle: &Handle) -> RepositoryResult<Option<User>>;
}
