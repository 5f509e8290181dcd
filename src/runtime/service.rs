use async_trait::async_trait;

/// HTTP verb a method is exposed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }
}

// Service metadata for registration
#[derive(Debug, Clone, Copy)]
pub struct MethodDefinition {
    pub name: &'static str,
    pub verb: Verb,
}

// Core trait that all services must implement
#[async_trait]
pub trait Service: Send + Sync {
    type Error: Send + Sync + std::error::Error + 'static;

    fn service_name(&self) -> &'static str;

    fn methods(&self) -> &'static [MethodDefinition];

    fn method(&self, name: &str) -> Option<MethodDefinition> {
        self.methods().iter().find(|m| m.name == name).copied()
    }

    // Method dispatch - services implement this to handle method calls
    async fn call_method(
        &self,
        method_name: &str,
        args: Vec<u8>, // Serialized arguments
    ) -> Result<Vec<u8>, Self::Error>; // Serialized result
}
