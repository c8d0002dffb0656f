//! The curated set of internal nodes exposed as agent tools, transcribed
//! from `examples/original_source/backend/core/mcp/tool_registry.py`'s
//! `register_internal_nodes_as_tools`.

use serde_json::Value;

pub struct CuratedTool {
    pub name: &'static str,
    pub description: &'static str,
    pub node_type: &'static str,
    pub category: &'static str,
    pub schema: fn() -> Value,
}

macro_rules! curated {
    ($name:expr, $description:expr, $node_type:expr, $category:expr, $schema:expr) => {
        CuratedTool {
            name: $name,
            description: $description,
            node_type: $node_type,
            category: $category,
            schema: || $schema,
        }
    };
}

pub static CURATED_INTERNAL_TOOLS: &[CuratedTool] = &[
    curated!(
        "generate_blog_post",
        "Generate a complete blog post on a given topic with SEO optimization",
        "blog_generator",
        "content",
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {"type": "string", "description": "The topic to write about"},
                "tone": {"type": "string", "description": "Writing tone (professional, casual, etc.)"},
                "length": {"type": "string", "description": "Target length (short, medium, long)"},
            },
            "required": ["topic"],
        })
    ),
    curated!(
        "generate_proposal",
        "Generate a business proposal document",
        "proposal_generator",
        "content",
        serde_json::json!({
            "type": "object",
            "properties": {
                "client_name": {"type": "string", "description": "Client name"},
                "project_description": {"type": "string", "description": "Project description"},
                "budget_range": {"type": "string", "description": "Budget range"},
            },
            "required": ["project_description"],
        })
    ),
    curated!(
        "generate_brand_content",
        "Generate brand-consistent content",
        "brand_generator",
        "content",
        serde_json::json!({
            "type": "object",
            "properties": {
                "brand_info": {"type": "string", "description": "Brand information and guidelines"},
                "content_type": {"type": "string", "description": "Type of content to generate"},
            },
            "required": ["brand_info"],
        })
    ),
    curated!(
        "score_lead",
        "Score a sales lead based on provided information",
        "lead_scorer",
        "sales",
        serde_json::json!({
            "type": "object",
            "properties": {
                "lead_data": {"type": "string", "description": "Lead information to analyze"},
            },
            "required": ["lead_data"],
        })
    ),
    curated!(
        "summarize_meeting",
        "Generate a summary of a meeting transcript",
        "meeting_summarizer",
        "productivity",
        serde_json::json!({
            "type": "object",
            "properties": {
                "transcript": {"type": "string", "description": "Meeting transcript"},
            },
            "required": ["transcript"],
        })
    ),
    curated!(
        "analyze_data",
        "Perform intelligent analysis on data",
        "smart_data_analyzer",
        "intelligence",
        serde_json::json!({
            "type": "object",
            "properties": {
                "data": {"type": "string", "description": "Data to analyze (JSON or text)"},
                "analysis_type": {"type": "string", "description": "Type of analysis to perform"},
            },
            "required": ["data"],
        })
    ),
    curated!(
        "moderate_content",
        "Check content for policy violations",
        "content_moderator",
        "safety",
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {"type": "string", "description": "Content to moderate"},
            },
            "required": ["content"],
        })
    ),
    curated!(
        "generate_chart",
        "Generate a chart/visualization from data",
        "auto_chart_generator",
        "intelligence",
        serde_json::json!({
            "type": "object",
            "properties": {
                "data": {"type": "string", "description": "Data to visualize"},
                "chart_type": {"type": "string", "description": "Type of chart"},
            },
            "required": ["data"],
        })
    ),
    curated!(
        "search_knowledge_base",
        "Search a knowledge base using semantic search",
        "vector_search",
        "knowledge",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "index_id": {"type": "string", "description": "Knowledge base ID"},
                "top_k": {"type": "integer", "description": "Number of results"},
            },
            "required": ["query"],
        })
    ),
    curated!(
        "chat_with_context",
        "Chat with LLM using retrieved context",
        "chat",
        "llm",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "User query"},
                "context": {"type": "string", "description": "Context to use"},
            },
            "required": ["query"],
        })
    ),
];
