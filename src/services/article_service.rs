//! Article service: listings, likes, comments and counters.
//!
//! Author display fields are never stored. Every path that hands an article
//! out goes through [`attach_author`] (and [`attach_comment_author`] for
//! embedded comments) with the owner's current profile.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Article, ArticleInput, AuthorProfile, Comment};
use crate::repositories::{ArticleStore, UserStore};

/// Copies the author's display fields onto an article.
pub fn attach_author(mut article: Article, author: &AuthorProfile) -> Article {
    article.author_first_name = author.first_name.clone();
    article.author_last_name = author.last_name.clone();
    article.author_username = author.username.clone();
    article.author_profile_picture = author.profile_picture.clone();
    article
}

/// Copies the commenter's display fields onto a comment.
pub fn attach_comment_author(mut comment: Comment, author: &AuthorProfile) -> Comment {
    comment.author_username = author.username.clone();
    comment.author_profile_picture = author.profile_picture.clone();
    comment
}

fn with_viewer(mut article: Article, viewer: Option<Uuid>) -> Article {
    article.has_liked = viewer.is_some_and(|v| article.is_liked_by(v));
    article
}

#[derive(Clone)]
pub struct ArticleService {
    articles: Arc<dyn ArticleStore>,
    users: Arc<dyn UserStore>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleStore>, users: Arc<dyn UserStore>) -> Self {
        Self { articles, users }
    }

    /// Current profiles for `ids`, keyed by user id. Unknown ids are absent.
    async fn profiles(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, AuthorProfile>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = self.users.find_by_ids(&unique).await?;
        Ok(users
            .iter()
            .map(|user| (user.id, AuthorProfile::from(user)))
            .collect())
    }

    /// Owner profile for a single user; blank when the owner is gone.
    async fn profile(&self, user_id: Uuid) -> AppResult<AuthorProfile> {
        Ok(match self.users.find_by_id(user_id).await? {
            Some(user) => AuthorProfile::from(&user),
            None => {
                tracing::warn!(user_id = %user_id, "Article owner not found");
                AuthorProfile::default()
            }
        })
    }

    async fn enrich_all(&self, articles: Vec<Article>, viewer: Option<Uuid>) -> AppResult<Vec<Article>> {
        let owners: Vec<Uuid> = articles.iter().map(|a| a.user_id).collect();
        let profiles = self.profiles(&owners).await?;
        let blank = AuthorProfile::default();

        Ok(articles
            .into_iter()
            .map(|article| {
                let author = profiles.get(&article.user_id).unwrap_or(&blank);
                with_viewer(attach_author(article, author), viewer)
            })
            .collect())
    }

    /// All articles, newest first, with authors and the viewer's like flag.
    pub async fn find_all(&self, viewer: Option<Uuid>) -> AppResult<Vec<Article>> {
        let articles = self.articles.list_all().await?;
        tracing::debug!(count = articles.len(), "Loaded articles");
        self.enrich_all(articles, viewer).await
    }

    /// One article with its author and its comments' authors resolved.
    pub async fn find_by_id(&self, id: Uuid, viewer: Option<Uuid>) -> AppResult<Option<Article>> {
        let Some(mut article) = self.articles.find_by_id(id).await? else {
            return Ok(None);
        };

        let commenters: Vec<Uuid> = article.comments.iter().map(|c| c.user_id).collect();
        let profiles = self.profiles(&commenters).await?;
        let blank = AuthorProfile::default();
        article.comments = std::mem::take(&mut article.comments)
            .into_iter()
            .map(|comment| {
                let author = profiles.get(&comment.user_id).unwrap_or(&blank);
                attach_comment_author(comment, author)
            })
            .collect();

        let author = self.profile(article.user_id).await?;
        Ok(Some(with_viewer(attach_author(article, &author), viewer)))
    }

    /// Articles owned by `user_id`, newest first; the owner is looked up once.
    ///
    /// `has_liked` is set for `viewer` as in [`Self::find_all`].
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        viewer: Option<Uuid>,
    ) -> AppResult<Vec<Article>> {
        let articles = self.articles.find_by_user(user_id).await?;
        let author = self.profile(user_id).await?;
        Ok(articles
            .into_iter()
            .map(|article| with_viewer(attach_author(article, &author), viewer))
            .collect())
    }

    /// Articles owned by the user's friends, newest first.
    pub async fn find_for_friends_of(&self, user_id: Uuid) -> AppResult<Vec<Article>> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(Vec::new());
        };
        let articles = self.articles.find_by_users(&user.friends).await?;
        self.enrich_all(articles, Some(user_id)).await
    }

    /// Creates a listing owned by `user_id`.
    ///
    /// A missing owner does not fail the insert; the article is returned with
    /// blank author fields.
    pub async fn create(&self, user_id: Uuid, input: ArticleInput) -> AppResult<Article> {
        input.validate()?;

        let author = match self.profile(user_id).await {
            Ok(author) => author,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Owner lookup failed, inserting without author");
                AuthorProfile::default()
            }
        };
        let article = attach_author(Article::new(user_id, input), &author);

        self.articles.insert(&article).await?;
        tracing::info!(article_id = %article.id, user_id = %user_id, "Article created");
        Ok(article)
    }

    /// Full replace under `id` with re-resolved author fields.
    ///
    /// An `id` that matches nothing is a silent no-op.
    pub async fn update(&self, id: Uuid, mut article: Article) -> AppResult<Article> {
        article.id = id;
        let author = self.profile(article.user_id).await?;
        let article = attach_author(article, &author);

        let matched = self.articles.replace(&article).await?;
        if matched == 0 {
            tracing::warn!(article_id = %id, "Update matched no article");
        } else {
            tracing::info!(article_id = %id, "Article updated");
        }
        Ok(article)
    }

    async fn owned(&self, id: Uuid, requester: Uuid) -> AppResult<Article> {
        let article = self
            .articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("articles", "id", id))?;
        if !article.is_owned_by(requester) {
            return Err(AppError::Forbidden {
                message: format!("article {id} is not owned by {requester}"),
            });
        }
        Ok(article)
    }

    /// Edits a listing on behalf of `requester`, who must own it.
    pub async fn update_owned(
        &self,
        id: Uuid,
        requester: Uuid,
        input: ArticleInput,
    ) -> AppResult<Article> {
        input.validate()?;
        let mut article = self.owned(id, requester).await?;
        article.apply(input);
        self.update(id, article).await
    }

    /// Deletes a listing on behalf of `requester`, who must own it.
    pub async fn delete_owned(&self, id: Uuid, requester: Uuid) -> AppResult<()> {
        self.owned(id, requester).await?;
        self.delete(id).await?;
        Ok(())
    }

    /// Deletes one article; zero matches are logged, not reported.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self.articles.delete(id).await?;
        if deleted == 0 {
            tracing::warn!(article_id = %id, "Delete matched no article");
        }
        Ok(deleted > 0)
    }

    pub async fn delete_all(&self) -> AppResult<usize> {
        let deleted = self.articles.delete_all().await?;
        tracing::info!(deleted, "All articles deleted");
        Ok(deleted)
    }

    /// Flips `user_id`'s membership in the likes; false for an unknown article.
    pub async fn toggle_like(&self, article_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let changed = self.articles.toggle_like(article_id, user_id).await?;
        tracing::debug!(article_id = %article_id, user_id = %user_id, changed, "Like toggled");
        Ok(changed)
    }

    /// Appends a comment by `user_id`.
    ///
    /// Returns `None` when the user does not exist. The article is not checked
    /// first, so a comment on an unknown article is silently dropped.
    pub async fn add_comment(
        &self,
        article_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> AppResult<Option<Comment>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("content", "Comment content is required"));
        }
        let Some(user) = self.users.find_by_id(user_id).await? else {
            tracing::warn!(user_id = %user_id, "Comment by unknown user");
            return Ok(None);
        };

        let comment = attach_comment_author(
            Comment::new(user_id, content),
            &AuthorProfile::from(&user),
        );
        let matched = self.articles.push_comment(article_id, &comment).await?;
        if matched == 0 {
            tracing::debug!(article_id = %article_id, "Comment appended to no article");
        }
        Ok(Some(comment))
    }

    /// Removes a comment only if `user_id` wrote it.
    pub async fn delete_comment(
        &self,
        article_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<bool> {
        self.articles
            .pull_comment(article_id, comment_id, user_id)
            .await
    }

    pub async fn increment_share_count(&self, article_id: Uuid) -> AppResult<bool> {
        self.articles.increment_share_count(article_id).await
    }

    pub async fn increment_views(&self, article_id: Uuid) -> AppResult<bool> {
        self.articles.increment_views(article_id).await
    }

    /// Current view count, 0 for an unknown article.
    pub async fn get_views(&self, article_id: Uuid) -> AppResult<i64> {
        Ok(self.articles.views(article_id).await?.unwrap_or(0))
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.articles.ensure_indexes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, User};
    use crate::repositories::Repositories;
    use proptest::prelude::*;

    struct Fixture {
        repos: Repositories,
        articles: ArticleService,
    }

    impl Fixture {
        fn new() -> Self {
            let repos = Repositories::in_memory();
            let articles = ArticleService::new(repos.articles.clone(), repos.users.clone());
            Self { repos, articles }
        }

        async fn user(&self, email: &str, first_name: &str) -> User {
            let user = User::new(NewUser {
                email: email.to_string(),
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                username: first_name.to_lowercase(),
                profile_picture: format!("/img/{}.png", first_name.to_lowercase()),
                ..Default::default()
            });
            self.repos.users.insert(&user).await.unwrap();
            user
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
    }

    #[test]
    fn test_attach_author_overwrites_display_fields() {
        let mut article = Article::new(Uuid::new_v4(), ArticleInput::titled("Bike", 100));
        article.author_first_name = "Stale".to_string();
        let author = AuthorProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: "ada".to_string(),
            profile_picture: "/ada.png".to_string(),
        };

        let article = attach_author(article, &author);
        assert_eq!(article.author_first_name, "Ada");
        assert_eq!(article.author_profile_picture, "/ada.png");

        let blank = attach_author(article, &AuthorProfile::default());
        assert_eq!(blank.author_username, "");
    }

    #[tokio::test]
    async fn test_author_fields_follow_the_owner() {
        let fx = Fixture::new();
        let mut ada = fx.user("a@x.com", "Ada").await;
        let bike = fx
            .articles
            .create(ada.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();

        let found = fx.articles.find_by_id(bike.id, None).await.unwrap().unwrap();
        assert_eq!(found.author_first_name, "Ada");
        assert_eq!(found.author_username, "ada");
        assert_eq!(found.price, bigdecimal::BigDecimal::from(100));

        ada.first_name = "Augusta".to_string();
        fx.repos.users.replace(&ada).await.unwrap();

        let found = fx.articles.find_by_id(bike.id, None).await.unwrap().unwrap();
        assert_eq!(found.author_first_name, "Augusta");
    }

    #[tokio::test]
    async fn test_create_without_owner_still_inserts() {
        let fx = Fixture::new();
        let orphan = fx
            .articles
            .create(Uuid::new_v4(), ArticleInput::titled("Lamp", 5))
            .await
            .unwrap();

        assert_eq!(orphan.author_first_name, "");
        assert!(fx.articles.find_by_id(orphan.id, None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let fx = Fixture::new();
        let err = fx
            .articles
            .create(Uuid::new_v4(), ArticleInput::titled("   ", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "title"));
    }

    #[tokio::test]
    async fn test_like_then_unlike_scenario() {
        let fx = Fixture::new();
        let ada = fx.user("a@x.com", "Ada").await;
        let bike = fx
            .articles
            .create(ada.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();

        assert!(fx.articles.toggle_like(bike.id, ada.id).await.unwrap());
        let liked = fx.articles.find_by_id(bike.id, Some(ada.id)).await.unwrap().unwrap();
        assert_eq!(liked.likes, vec![ada.id]);
        assert!(liked.has_liked);

        assert!(fx.articles.toggle_like(bike.id, ada.id).await.unwrap());
        let unliked = fx.articles.find_by_id(bike.id, Some(ada.id)).await.unwrap().unwrap();
        assert!(unliked.likes.is_empty());
        assert!(!unliked.has_liked);

        assert!(!fx.articles.toggle_like(Uuid::new_v4(), ada.id).await.unwrap());
    }

    proptest! {
        #[test]
        fn prop_toggle_like_has_set_semantics(toggles in proptest::collection::vec(0usize..3, 0..20)) {
            let rt = runtime();
            rt.block_on(async {
                let fx = Fixture::new();
                let owner = fx.user("o@x.com", "Owner").await;
                let article = fx
                    .articles
                    .create(owner.id, ArticleInput::titled("Desk", 40))
                    .await
                    .unwrap();
                let likers = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

                let mut expected = [false; 3];
                for &i in &toggles {
                    fx.articles.toggle_like(article.id, likers[i]).await.unwrap();
                    expected[i] = !expected[i];
                }

                let stored = fx.articles.find_by_id(article.id, None).await.unwrap().unwrap();
                for (i, liker) in likers.iter().enumerate() {
                    let occurrences = stored.likes.iter().filter(|id| *id == liker).count();
                    prop_assert_eq!(occurrences, usize::from(expected[i]));
                }
                Ok(())
            })?;
        }

        #[test]
        fn prop_views_count_every_increment(n in 0usize..40) {
            let rt = runtime();
            rt.block_on(async {
                let fx = Fixture::new();
                let article = fx
                    .articles
                    .create(Uuid::new_v4(), ArticleInput::titled("Chair", 10))
                    .await
                    .unwrap();

                for _ in 0..n {
                    prop_assert!(fx.articles.increment_views(article.id).await.unwrap());
                    fx.articles.get_views(article.id).await.unwrap();
                }
                prop_assert_eq!(fx.articles.get_views(article.id).await.unwrap(), n as i64);
                Ok(())
            })?;
        }
    }

    #[tokio::test]
    async fn test_counters_on_missing_article() {
        let fx = Fixture::new();
        let missing = Uuid::new_v4();
        assert!(!fx.articles.increment_views(missing).await.unwrap());
        assert!(!fx.articles.increment_share_count(missing).await.unwrap());
        assert_eq!(fx.articles.get_views(missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_share_count() {
        let fx = Fixture::new();
        let article = fx
            .articles
            .create(Uuid::new_v4(), ArticleInput::titled("Chair", 10))
            .await
            .unwrap();
        fx.articles.increment_share_count(article.id).await.unwrap();
        fx.articles.increment_share_count(article.id).await.unwrap();

        let stored = fx.articles.find_by_id(article.id, None).await.unwrap().unwrap();
        assert_eq!(stored.share_count, 2);
    }

    #[tokio::test]
    async fn test_comments_need_matching_author_to_delete() {
        let fx = Fixture::new();
        let ada = fx.user("a@x.com", "Ada").await;
        let eve = fx.user("e@x.com", "Eve").await;
        let bike = fx
            .articles
            .create(ada.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();

        let comment = fx
            .articles
            .add_comment(bike.id, eve.id, " Still available? ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comment.content, "Still available?");
        assert_eq!(comment.author_username, "eve");

        assert!(!fx.articles.delete_comment(bike.id, comment.id, ada.id).await.unwrap());
        let stored = fx.articles.find_by_id(bike.id, None).await.unwrap().unwrap();
        assert_eq!(stored.comments.len(), 1);
        assert_eq!(stored.comments[0].author_profile_picture, "/img/eve.png");

        assert!(fx.articles.delete_comment(bike.id, comment.id, eve.id).await.unwrap());
        let stored = fx.articles.find_by_id(bike.id, None).await.unwrap().unwrap();
        assert!(stored.comments.is_empty());
    }

    #[tokio::test]
    async fn test_comment_by_unknown_user_is_none() {
        let fx = Fixture::new();
        let bike = fx
            .articles
            .create(Uuid::new_v4(), ArticleInput::titled("Bike", 100))
            .await
            .unwrap();

        let comment = fx
            .articles
            .add_comment(bike.id, Uuid::new_v4(), "hi")
            .await
            .unwrap();
        assert!(comment.is_none());
    }

    #[tokio::test]
    async fn test_comment_on_unknown_article_is_silent() {
        let fx = Fixture::new();
        let ada = fx.user("a@x.com", "Ada").await;
        let comment = fx
            .articles
            .add_comment(Uuid::new_v4(), ada.id, "hello")
            .await
            .unwrap();
        assert!(comment.is_some());
    }

    #[tokio::test]
    async fn test_feeds() {
        let fx = Fixture::new();
        let ada = fx.user("a@x.com", "Ada").await;
        let bob = fx.user("b@x.com", "Bob").await;
        let eve = fx.user("e@x.com", "Eve").await;
        fx.repos.users.add_friend(ada.id, bob.id).await.unwrap();

        let bikes = fx
            .articles
            .create(bob.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();
        fx.articles
            .create(eve.id, ArticleInput::titled("Lamp", 5))
            .await
            .unwrap();
        fx.articles.toggle_like(bikes.id, ada.id).await.unwrap();

        let all = fx.articles.find_all(Some(ada.id)).await.unwrap();
        assert_eq!(all.len(), 2);
        let bike = all.iter().find(|a| a.id == bikes.id).unwrap();
        assert!(bike.has_liked);
        assert_eq!(bike.author_first_name, "Bob");

        let friends = fx.articles.find_for_friends_of(ada.id).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].author_username, "bob");

        let by_eve = fx.articles.find_by_user(eve.id, None).await.unwrap();
        assert_eq!(by_eve.len(), 1);
        assert_eq!(by_eve[0].author_first_name, "Eve");
        assert!(!by_eve[0].has_liked);

        let by_bob = fx.articles.find_by_user(bob.id, Some(ada.id)).await.unwrap();
        assert!(by_bob[0].has_liked);
        let by_bob = fx.articles.find_by_user(bob.id, Some(eve.id)).await.unwrap();
        assert!(!by_bob[0].has_liked);

        assert!(fx.articles.find_for_friends_of(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_article_is_silent() {
        let fx = Fixture::new();
        let ghost = Article::new(Uuid::new_v4(), ArticleInput::titled("Ghost", 1));
        fx.articles.update(ghost.id, ghost.clone()).await.unwrap();
        assert!(fx.articles.find_by_id(ghost.id, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owned_changes() {
        let fx = Fixture::new();
        let ada = fx.user("a@x.com", "Ada").await;
        let eve = fx.user("e@x.com", "Eve").await;
        let bike = fx
            .articles
            .create(ada.id, ArticleInput::titled("Bike", 100))
            .await
            .unwrap();

        let err = fx
            .articles
            .update_owned(bike.id, eve.id, ArticleInput::titled("Mine now", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));

        let updated = fx
            .articles
            .update_owned(bike.id, ada.id, ArticleInput::titled("Road bike", 120))
            .await
            .unwrap();
        assert_eq!(updated.title, "Road bike");
        assert_eq!(updated.author_first_name, "Ada");

        let err = fx.articles.delete_owned(bike.id, eve.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
        fx.articles.delete_owned(bike.id, ada.id).await.unwrap();

        let err = fx.articles.delete_owned(bike.id, ada.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let fx = Fixture::new();
        for title in ["A", "B", "C"] {
            fx.articles
                .create(Uuid::new_v4(), ArticleInput::titled(title, 1))
                .await
                .unwrap();
        }
        assert_eq!(fx.articles.delete_all().await.unwrap(), 3);
        assert!(fx.articles.find_all(None).await.unwrap().is_empty());
        assert!(!fx.articles.delete(Uuid::new_v4()).await.unwrap());
    }
}
