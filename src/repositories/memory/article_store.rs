use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::newest_first;
use crate::error::AppResult;
use crate::models::{Article, Comment};
use crate::repositories::ArticleStore;

#[derive(Default)]
pub struct MemoryArticleStore {
    articles: DashMap<Uuid, Article>,
}

/// The stored form of an article: read-time fields cleared.
fn persisted(article: &Article) -> Article {
    let mut stored = article.clone();
    stored.author_first_name.clear();
    stored.author_last_name.clear();
    stored.author_username.clear();
    stored.author_profile_picture.clear();
    stored.has_liked = false;
    for comment in &mut stored.comments {
        comment.author_username.clear();
        comment.author_profile_picture.clear();
    }
    stored
}

impl MemoryArticleStore {
    fn collect(&self, keep: impl Fn(&Article) -> bool) -> Vec<Article> {
        let mut articles: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| keep(a.value()))
            .map(|a| a.value().clone())
            .collect();
        newest_first(&mut articles, |a| a.created_at);
        articles
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn list_all(&self) -> AppResult<Vec<Article>> {
        Ok(self.collect(|_| true))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Article>> {
        Ok(self.articles.get(&id).map(|a| a.value().clone()))
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Article>> {
        Ok(self.collect(|a| a.user_id == user_id))
    }

    async fn find_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Article>> {
        Ok(self.collect(|a| user_ids.contains(&a.user_id)))
    }

    async fn insert(&self, article: &Article) -> AppResult<()> {
        self.articles.insert(article.id, persisted(article));
        Ok(())
    }

    async fn replace(&self, article: &Article) -> AppResult<usize> {
        Ok(match self.articles.get_mut(&article.id) {
            Some(mut stored) => {
                *stored = persisted(article);
                1
            }
            None => 0,
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<usize> {
        Ok(usize::from(self.articles.remove(&id).is_some()))
    }

    async fn delete_all(&self) -> AppResult<usize> {
        let count = self.articles.len();
        self.articles.clear();
        Ok(count)
    }

    async fn toggle_like(&self, article_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let Some(mut article) = self.articles.get_mut(&article_id) else {
            return Ok(false);
        };
        if article.likes.contains(&user_id) {
            article.likes.retain(|id| *id != user_id);
        } else {
            article.likes.push(user_id);
        }
        Ok(true)
    }

    async fn push_comment(&self, article_id: Uuid, comment: &Comment) -> AppResult<usize> {
        Ok(match self.articles.get_mut(&article_id) {
            Some(mut article) => {
                let mut stored = comment.clone();
                stored.author_username.clear();
                stored.author_profile_picture.clear();
                article.comments.push(stored);
                1
            }
            None => 0,
        })
    }

    async fn pull_comment(
        &self,
        article_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<bool> {
        let Some(mut article) = self.articles.get_mut(&article_id) else {
            return Ok(false);
        };
        let before = article.comments.len();
        article
            .comments
            .retain(|c| !(c.id == comment_id && c.user_id == user_id));
        Ok(article.comments.len() != before)
    }

    async fn increment_share_count(&self, id: Uuid) -> AppResult<bool> {
        Ok(match self.articles.get_mut(&id) {
            Some(mut article) => {
                article.share_count += 1;
                true
            }
            None => false,
        })
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        Ok(match self.articles.get_mut(&id) {
            Some(mut article) => {
                article.views += 1;
                true
            }
            None => false,
        })
    }

    async fn views(&self, id: Uuid) -> AppResult<Option<i64>> {
        Ok(self.articles.get(&id).map(|a| a.views))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
