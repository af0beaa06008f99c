//! Code-graph handler: fixed Cypher templates, model-generated queries otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use sy_llm::ChatModel;
use sy_protocol::{ChatMessage, ConsensusResult, Domain};

use super::{DomainHandler, DownstreamCall, HandlerOutcome};

const DEFAULT_DEPTH: i64 = 2;
const MAX_DEPTH: i64 = 5;

const LIST_REPOSITORIES: &str = "MATCH (r:Repository) RETURN r.organization AS organization, r.name AS name, r.url AS url ORDER BY r.organization, r.name";
const STATS: &str = "MATCH (r:Repository) WITH count(r) AS repo_count \
MATCH (c:Class) WITH repo_count, count(c) AS class_count \
MATCH (m:Method) WITH repo_count, class_count, count(m) AS method_count \
MATCH ()-[rel]->() RETURN repo_count, class_count, method_count, count(rel) AS relationship_count";

const CYPHER_SYSTEM_PROMPT: &str = "You write Neo4j Cypher queries over a code graph. \
Node labels: Repository(organization, name, url), File(path), Class(name), Method(name). \
Relationships: (Repository)-[:CONTAINS]->(File), (File)-[:DEFINES]->(Class), \
(Class)-[:HAS_METHOD]->(Method), (Class)-[:DEPENDS_ON]->(Class), (Method)-[:CALLS]->(Method). \
Respond with ONLY the Cypher query, no explanation and no markdown.";

pub struct GraphDbHandler {
    model: Arc<dyn ChatModel>,
}

impl GraphDbHandler {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    async fn generate(&self, raw_text: &str) -> HandlerOutcome {
        let messages = [
            ChatMessage::system(CYPHER_SYSTEM_PROMPT),
            ChatMessage::user(raw_text.trim()),
        ];
        match self.model.complete(&messages).await {
            Ok(reply) => match clean_cypher(&reply) {
                Some(query) => HandlerOutcome::Call(DownstreamCall::Cypher {
                    query,
                    generated: true,
                }),
                None => HandlerOutcome::Reply("The model did not return a Cypher query.".into()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "cypher generation failed");
                HandlerOutcome::Reply(format!("Could not generate a graph query: {e}"))
            }
        }
    }
}

#[async_trait]
impl DomainHandler for GraphDbHandler {
    fn domain(&self) -> Domain {
        Domain::GraphDb
    }

    async fn handle(&self, raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let fields = &detected.fields;
        let depth = fields
            .get_int("depth")
            .unwrap_or(DEFAULT_DEPTH)
            .clamp(1, MAX_DEPTH);
        let class = fields.get_str("class_name");
        let method = fields.get_str("method_name");

        let query = match (detected.action.as_str(), class, method) {
            ("list_repositories", _, _) => LIST_REPOSITORIES.to_string(),
            ("stats", _, _) => STATS.to_string(),
            ("dependencies", Some(class), _) => format!(
                "MATCH (c:Class {{name: {}}})-[:DEPENDS_ON*1..{depth}]->(d:Class) RETURN DISTINCT d.name AS dependency",
                quote(class)
            ),
            ("impact", Some(class), _) => format!(
                "MATCH (d:Class)-[:DEPENDS_ON*1..{depth}]->(c:Class {{name: {}}}) RETURN DISTINCT d.name AS affected",
                quote(class)
            ),
            ("impact", None, Some(method)) => format!(
                "MATCH (caller:Method)-[:CALLS*1..{depth}]->(m:Method {{name: {}}}) RETURN DISTINCT caller.name AS affected",
                quote(method)
            ),
            ("relationships", Some(class), _) => format!(
                "MATCH (c:Class {{name: {}}})-[r]-(other) RETURN type(r) AS relationship, labels(other) AS kind, other.name AS name",
                quote(class)
            ),
            ("relationships", None, Some(method)) => format!(
                "MATCH (m:Method {{name: {}}})-[r]-(other) RETURN type(r) AS relationship, labels(other) AS kind, other.name AS name",
                quote(method)
            ),
            // Free queries, unknown actions and targetless requests.
            _ => return self.generate(raw_text).await,
        };
        HandlerOutcome::Call(DownstreamCall::Cypher {
            query,
            generated: false,
        })
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Strip fences and surrounding prose markers from a model-written query.
fn clean_cypher(reply: &str) -> Option<String> {
    let mut text = reply.trim();
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after
            .strip_prefix("cypher")
            .or_else(|| after.strip_prefix("sql"))
            .unwrap_or(after);
        text = after.find("```").map_or(after, |end| &after[..end]).trim();
    }
    let query = text.trim().trim_end_matches(';').trim();
    let upper = query.to_uppercase();
    (upper.contains("MATCH") || upper.contains("RETURN") || upper.starts_with("CALL"))
        .then(|| query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::detected;
    use sy_llm::MockChatModel;
    use sy_protocol::Fields;

    fn handler(mock: &Arc<MockChatModel>) -> GraphDbHandler {
        GraphDbHandler::new(Arc::clone(mock) as Arc<dyn ChatModel>)
    }

    #[tokio::test]
    async fn dependencies_template() {
        let mock = Arc::new(MockChatModel::new());
        let fields = Fields::new().with("class_name", "UserService").with("depth", 3i64);
        let outcome = handler(&mock)
            .handle("", &detected(Domain::GraphDb, "dependencies", fields))
            .await;

        let HandlerOutcome::Call(DownstreamCall::Cypher { query, generated }) = outcome else {
            panic!("expected cypher");
        };
        assert!(!generated);
        assert!(query.contains("{name: 'UserService'}"));
        assert!(query.contains("*1..3"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_action_generates_query() {
        let mock = Arc::new(MockChatModel::new().reply(
            "```cypher\nMATCH (c:Class) WHERE c.name CONTAINS 'Pay' RETURN c.name;\n```",
        ));
        let outcome = handler(&mock)
            .handle(
                "classes with Pay in the name",
                &detected(Domain::GraphDb, "unknown", Fields::new()),
            )
            .await;

        assert_eq!(
            outcome,
            HandlerOutcome::Call(DownstreamCall::Cypher {
                query: "MATCH (c:Class) WHERE c.name CONTAINS 'Pay' RETURN c.name".into(),
                generated: true,
            })
        );
        let prompt = mock.last_prompt().unwrap();
        assert_eq!(prompt[1].content, "classes with Pay in the name");
    }

    #[tokio::test]
    async fn generation_failure_is_reply() {
        let mock = Arc::new(MockChatModel::new().fail("offline"));
        let outcome = handler(&mock)
            .handle("anything", &detected(Domain::GraphDb, "query", Fields::new()))
            .await;
        assert!(matches!(outcome, HandlerOutcome::Reply(text) if text.contains("offline")));
    }

    #[test]
    fn quoting_and_cleanup() {
        assert_eq!(quote("O'Brien"), "'O\\'Brien'");
        assert_eq!(clean_cypher("I cannot help with that"), None);
        assert_eq!(clean_cypher("MATCH (n) RETURN n").as_deref(), Some("MATCH (n) RETURN n"));
    }
}
