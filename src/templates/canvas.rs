//! Canned task sets for the Canvas agent's `createCanvas` tool call

use std::sync::atomic::{AtomicU64, Ordering};

use super::jobs::{AssignedAgent, Job};

const CANVAS_KEYWORDS: &[&str] = &[
    "canvas",
    "create canvas",
    "task breakdown",
    "decompose",
    "plan",
    "project",
    "build",
    "develop",
    "create",
];

/// Whether the message asks for a canvas to be created
pub fn is_canvas_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    CANVAS_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn canvas_title(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("web") {
        "Web Application Development"
    } else if lower.contains("scraping") {
        "Web Scraping System"
    } else if lower.contains("api") {
        "API Development Project"
    } else {
        "Project Planning Canvas"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasTaskSet {
    Web,
    Scraping,
    Api,
    Generic,
}

impl CanvasTaskSet {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("web") || lower.contains("website") {
            CanvasTaskSet::Web
        } else if lower.contains("scraping") || lower.contains("scrape") {
            CanvasTaskSet::Scraping
        } else if lower.contains("api") {
            CanvasTaskSet::Api
        } else {
            CanvasTaskSet::Generic
        }
    }
}

struct CanvasTemplate {
    title: &'static str,
    description: &'static str,
    agent_name: &'static str,
    agent_description: &'static str,
    capabilities: &'static [&'static str],
    pricing_usdt: f64,
    wallet_address: &'static str,
}

const WEB_TASKS: &[CanvasTemplate] = &[
    CanvasTemplate {
        title: "Frontend Development",
        description: "Create responsive user interface with React/Next.js",
        agent_name: "Frontend Specialist",
        agent_description: "Expert in React, TypeScript, and modern frontend frameworks",
        capabilities: &["React", "TypeScript", "CSS", "UI/UX"],
        pricing_usdt: 1.5,
        wallet_address: "0x742d35cc6565c1c6e9e9f8e8d8f5c4b3a2f1e0d9",
    },
    CanvasTemplate {
        title: "Backend API Development",
        description: "Build REST API with authentication and database integration",
        agent_name: "Backend Engineer",
        agent_description: "Specialized in Node.js, databases, and API design",
        capabilities: &["Node.js", "PostgreSQL", "REST APIs", "Authentication"],
        pricing_usdt: 2.0,
        wallet_address: "0x851e46ec6695d2c7f0f0a9a9e9f8c5d4c3b2a1f0",
    },
    CanvasTemplate {
        title: "Database Design",
        description: "Design database schema and optimization",
        agent_name: "Database Architect",
        agent_description: "Expert in database design, optimization, and migrations",
        capabilities: &["PostgreSQL", "Schema Design", "Performance Tuning", "Migrations"],
        pricing_usdt: 1.8,
        wallet_address: "0xa1b2c3d4e5f6789012345678901234567890abcd",
    },
];

const SCRAPING_TASKS: &[CanvasTemplate] = &[
    CanvasTemplate {
        title: "Web Scraper Development",
        description: "Build robust web scraper with rate limiting and error handling",
        agent_name: "Scraping Specialist",
        agent_description: "Expert in web scraping, data extraction, and automation",
        capabilities: &["Python", "Scrapy", "BeautifulSoup", "Selenium"],
        pricing_usdt: 1.2,
        wallet_address: "0xef1234567890abcdef1234567890abcdef123456",
    },
    CanvasTemplate {
        title: "Data Processing Pipeline",
        description: "Process and clean scraped data for storage",
        agent_name: "Data Engineer",
        agent_description: "Specialized in data processing and ETL pipelines",
        capabilities: &["Python", "Pandas", "Data Cleaning", "ETL"],
        pricing_usdt: 1.4,
        wallet_address: "0x123456789abcdef123456789abcdef123456789a",
    },
];

const API_TASKS: &[CanvasTemplate] = &[CanvasTemplate {
    title: "API Design & Documentation",
    description: "Design RESTful API endpoints and create comprehensive documentation",
    agent_name: "API Architect",
    agent_description: "Expert in API design, documentation, and best practices",
    capabilities: &["REST API", "OpenAPI", "Documentation", "Design Patterns"],
    pricing_usdt: 1.6,
    wallet_address: "0x9876543210fedcba9876543210fedcba98765432",
}];

// The first generic description is built from the request at runtime
const GENERIC_TASKS: &[CanvasTemplate] = &[
    CanvasTemplate {
        title: "Project Analysis",
        description: "",
        agent_name: "Project Analyst",
        agent_description: "Expert in requirement analysis and project planning",
        capabilities: &["Analysis", "Planning", "Documentation", "Strategy"],
        pricing_usdt: 1.0,
        wallet_address: "0xabcdef123456789abcdef123456789abcdef1234",
    },
    CanvasTemplate {
        title: "Implementation",
        description: "Implement the core functionality and features",
        agent_name: "Development Specialist",
        agent_description: "Full-stack developer with broad technology expertise",
        capabilities: &["Full Stack", "Multiple Languages", "Problem Solving", "Testing"],
        pricing_usdt: 1.3,
        wallet_address: "0x567890abcdef567890abcdef567890abcdef5678",
    },
];

/// Builds canvas tasks with `task-{n}` / `agent-{n}` ids that keep counting
/// across requests
#[derive(Debug, Default)]
pub struct CanvasTaskGenerator {
    task_counter: AtomicU64,
    agent_counter: AtomicU64,
}

impl CanvasTaskGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(counter: &AtomicU64, prefix: &str) -> String {
        format!("{prefix}-{}", counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn generate(&self, message: &str) -> Vec<Job> {
        let set = CanvasTaskSet::classify(message);
        let templates = match set {
            CanvasTaskSet::Web => WEB_TASKS,
            CanvasTaskSet::Scraping => SCRAPING_TASKS,
            CanvasTaskSet::Api => API_TASKS,
            CanvasTaskSet::Generic => GENERIC_TASKS,
        };

        templates
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let description = if set == CanvasTaskSet::Generic && i == 0 {
                    let head: String = message.chars().take(100).collect();
                    format!("Analyze requirements for: {head}...")
                } else {
                    template.description.to_string()
                };

                Job {
                    id: Some(Self::next(&self.task_counter, "task")),
                    title: Some(template.title.to_string()),
                    description: Some(description),
                    status: Some("pending".to_string()),
                    assigned_agent: Some(AssignedAgent {
                        id: Some(Self::next(&self.agent_counter, "agent")),
                        name: template.agent_name.to_string(),
                        description: template.agent_description.to_string(),
                        capabilities: template
                            .capabilities
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                        pricing_usdt: Some(template.pricing_usdt),
                        wallet_address: Some(template.wallet_address.to_string()),
                        rating: None,
                        completed_tasks: None,
                        extra: Default::default(),
                    }),
                    extra: Default::default(),
                }
            })
            .collect()
    }
}
