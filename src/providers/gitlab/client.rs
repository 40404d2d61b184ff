mod core;
mod pipelines;
mod projects;

use async_trait::async_trait;

use crate::cleanup::{Pipeline, PipelineApi, ResolvedProject};
use crate::error::Result;

pub use self::core::GitLabClient;

#[async_trait]
impl PipelineApi for GitLabClient {
    async fn get_project(&self, path: &str) -> Result<ResolvedProject> {
        self.fetch_project(path).await
    }

    async fn get_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<ResolvedProject>> {
        self.fetch_group_projects(group, include_subgroups).await
    }

    async fn get_project_pipelines(&self, project_id: u64) -> Result<Vec<Pipeline>> {
        self.fetch_pipelines(project_id).await
    }

    async fn delete_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<()> {
        self.delete_project_pipeline(project_id, pipeline_id).await
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::auth::Token;
    use crate::error::JanitorError;

    fn client(server: &Server) -> GitLabClient {
        GitLabClient::new(&server.url(), Some(Token::from("glpat-test"))).unwrap()
    }

    fn page(number: usize) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), number.to_string()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ])
    }

    fn pipelines_json(ids: std::ops::Range<u64>) -> String {
        let pipelines: Vec<_> = ids
            .rev()
            .map(|id| {
                json!({
                    "id": id,
                    "iid": id,
                    "project_id": 42,
                    "status": "success",
                    "ref": "main",
                    "sha": "a1b2c3",
                    "created_at": "2024-01-01T00:00:00.000Z",
                    "updated_at": "2024-01-02T00:00:00.000Z",
                })
            })
            .collect();
        serde_json::to_string(&pipelines).unwrap()
    }

    #[tokio::test]
    async fn test_full_page_triggers_one_more_fetch() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/api/v4/projects/42/pipelines")
            .match_query(page(1))
            .match_header("private-token", "glpat-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(pipelines_json(1..101))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v4/projects/42/pipelines")
            .match_query(page(2))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let pipelines = client(&server).get_project_pipelines(42).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(pipelines.len(), 100);
        assert_eq!(pipelines[0].id, 100);
        assert_eq!(pipelines[99].id, 1);
    }

    #[tokio::test]
    async fn test_short_page_still_fetches_until_empty() {
        let mut server = Server::new_async().await;
        let _first = server
            .mock("GET", "/api/v4/projects/42/pipelines")
            .match_query(page(1))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(pipelines_json(1..4))
            .create_async()
            .await;
        let last = server
            .mock("GET", "/api/v4/projects/42/pipelines")
            .match_query(page(2))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let pipelines = client(&server).get_project_pipelines(42).await.unwrap();

        last.assert_async().await;
        assert_eq!(pipelines.len(), 3);
    }

    #[tokio::test]
    async fn test_group_projects_with_subgroups() {
        let mut server = Server::new_async().await;
        let body = json!([
            {"id": 1, "path_with_namespace": "g/sub/a", "archived": false},
            {"id": 2, "path_with_namespace": "g/sub/b", "archived": true},
        ]);
        let listing = server
            .mock("GET", "/api/v4/groups/g%2Fsub/projects")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("include_subgroups".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        let _end = server
            .mock("GET", "/api/v4/groups/g%2Fsub/projects")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let projects = client(&server)
            .get_group_projects("g/sub", true)
            .await
            .unwrap();

        listing.assert_async().await;
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].path_with_namespace, "g/sub/b");
        assert!(projects[1].archived);
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/api/v4/projects/g%2Fgone")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "404 Project Not Found"}"#)
            .create_async()
            .await;

        let err = client(&server).get_project("g/gone").await.unwrap_err();
        assert!(matches!(err, JanitorError::NotFound(ref what) if what == "Project 'g/gone'"));
    }

    #[tokio::test]
    async fn test_get_project() {
        let mut server = Server::new_async().await;
        let lookup = server
            .mock("GET", "/api/v4/projects/team%2Fsub%2Fapi")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 7, "path_with_namespace": "team/sub/api", "archived": false, "name": "api"}"#,
            )
            .create_async()
            .await;

        let project = client(&server).get_project("team/sub/api").await.unwrap();
        lookup.assert_async().await;
        assert_eq!(project.id, 7);
        assert_eq!(project.path_with_namespace, "team/sub/api");
    }

    #[tokio::test]
    async fn test_delete_pipeline() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/api/v4/projects/42/pipelines/7")
            .match_header("private-token", "glpat-test")
            .with_status(204)
            .create_async()
            .await;

        client(&server).delete_pipeline(42, 7).await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_pipeline_error_carries_message() {
        let mut server = Server::new_async().await;
        let _forbidden = server
            .mock("DELETE", "/api/v4/projects/42/pipelines/7")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "403 Forbidden"}"#)
            .create_async()
            .await;

        let err = client(&server).delete_pipeline(42, 7).await.unwrap_err();
        match err {
            JanitorError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "403 Forbidden");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_listing_error_stops_pagination() {
        let mut server = Server::new_async().await;
        let _unauthorized = server
            .mock("GET", "/api/v4/projects/42/pipelines")
            .match_query(page(1))
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid_token", "error_description": "Token expired"}"#)
            .create_async()
            .await;

        let err = client(&server).get_project_pipelines(42).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "GitLab API error (status 401): [invalid_token] Token expired"
        );
    }
}
