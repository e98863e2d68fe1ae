//! Stub backend shared by the integration tests.
//!
//! Parse behavior is picked by the source text:
//! - `throw:<message>` fails with `line = 7`, `column = 3`
//! - `panic` panics
//! - `handle` answers with a tree holding a live thread handle
//! - `sleep:<ms>:<tag>` sleeps, then echoes `tag`
//! - anything parsed as `SourceType::Script` is deferred

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parsebridge::metadata::{
    ParseOptions, ParseOutcome, SourceType, TokenLabels, TypesInfo, VisitorKeys,
};
use parsebridge::worker::{Backend, BackendError};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

pub const VERSION: &str = "7.24.0";

/// Per-query call counts, shared with the test after the backend moves.
#[derive(Debug, Default)]
pub struct Counters {
    pub version: AtomicUsize,
    pub types_info: AtomicUsize,
    pub visitor_keys: AtomicUsize,
    pub token_labels: AtomicUsize,
    pub parse: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Tree node; `Live` cannot be serialized.
pub enum Node {
    Tree(Value),
    Live(thread::Thread),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Tree(value) => value.serialize(serializer),
            Node::Live(_) => Err(S::Error::custom("live thread handle cannot be transported")),
        }
    }
}

pub struct StubBackend {
    pub counters: Arc<Counters>,
}

impl StubBackend {
    pub fn new() -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            Self {
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }
}

impl Backend for StubBackend {
    type Ast = Node;

    fn version(&self) -> Result<String, BackendError> {
        self.counters.version.fetch_add(1, Ordering::SeqCst);
        Ok(VERSION.to_string())
    }

    fn types_info(&self) -> Result<TypesInfo, BackendError> {
        self.counters.types_info.fetch_add(1, Ordering::SeqCst);
        let mut info = TypesInfo::default();
        info.flipped_alias_keys.insert(
            "Literal".to_string(),
            vec!["StringLiteral".to_string(), "NumericLiteral".to_string()],
        );
        info.visitor_keys = visitor_keys();
        Ok(info)
    }

    fn visitor_keys(&self) -> Result<VisitorKeys, BackendError> {
        self.counters.visitor_keys.fetch_add(1, Ordering::SeqCst);
        Ok(visitor_keys())
    }

    fn token_labels(&self) -> Result<TokenLabels, BackendError> {
        self.counters.token_labels.fetch_add(1, Ordering::SeqCst);
        let mut labels = TokenLabels::new();
        labels.insert("parenL".to_string(), "(".to_string());
        labels.insert("arrow".to_string(), "=>".to_string());
        Ok(labels)
    }

    fn maybe_parse(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<ParseOutcome<Node>, BackendError> {
        self.counters.parse.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = source.strip_prefix("throw:") {
            return Err(BackendError::new(message)
                .with_field("name", "SyntaxError")
                .with_field("line", 7)
                .with_field("column", 3));
        }
        if source == "panic" {
            panic!("parser state corrupted");
        }
        if source == "handle" {
            return Ok(ParseOutcome::Parsed {
                ast: Node::Live(thread::current()),
            });
        }
        if let Some(rest) = source.strip_prefix("sleep:") {
            let (millis, tag) = rest.split_once(':').unwrap_or((rest, ""));
            thread::sleep(Duration::from_millis(millis.parse().unwrap_or(0)));
            return Ok(ParseOutcome::Parsed {
                ast: Node::Tree(json!({"type": "Program", "tag": tag})),
            });
        }
        if options.source_type == SourceType::Script {
            return Ok(ParseOutcome::Deferred {
                options: options.clone().plugin("jsx"),
            });
        }
        Ok(ParseOutcome::Parsed {
            ast: Node::Tree(json!({"type": "Program", "source": source})),
        })
    }
}

fn visitor_keys() -> VisitorKeys {
    let mut keys = VisitorKeys::new();
    keys.insert("Program".to_string(), vec!["body".to_string()]);
    keys.insert(
        "BinaryExpression".to_string(),
        vec!["left".to_string(), "right".to_string()],
    );
    keys
}
