//! Rule-based job breakdowns
//!
//! A request is classified into a [`ProjectKind`] by keyword and expanded into
//! that kind's fixed catalog of jobs, each pre-assigned to a specialist
//! profile.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

const REQUEST_PLACEHOLDER: &str = "{request}";

/// Specialist profile attached to a job template
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub capabilities: &'static [&'static str],
    pub pricing_usdt: f64,
    pub wallet_address: &'static str,
    pub rating: f64,
    pub completed_tasks: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct JobTemplate {
    pub title: &'static str,
    /// Contains `{request}` where the user's request is substituted
    pub description: &'static str,
    pub agent: AgentProfile,
}

const WEB_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Frontend Development & UI Design",
        description: "Create responsive user interface for: {request}. Implement modern React/Next.js components with TypeScript, responsive design, and accessibility features.",
        agent: AgentProfile {
            name: "Frontend Specialist",
            description: "Expert in React, TypeScript, and modern frontend development",
            capabilities: &["React", "Next.js", "TypeScript", "Tailwind CSS", "UI/UX Design"],
            pricing_usdt: 2.5,
            wallet_address: "0x742d35cc6565c1c6e9e9f8e8d8f5c4b3a2f1e0d9",
            rating: 4.8,
            completed_tasks: 156,
        },
    },
    JobTemplate {
        title: "Backend API & Authentication",
        description: "Build secure REST API for: {request}. Implement authentication, authorization, data validation, and API documentation.",
        agent: AgentProfile {
            name: "Backend Engineer",
            description: "Specialized in Node.js, APIs, and server architecture",
            capabilities: &["Node.js", "Express", "PostgreSQL", "JWT", "REST APIs"],
            pricing_usdt: 3.0,
            wallet_address: "0x851e46ec6695d2c7f0f0a9a9e9f8c5d4c3b2a1f0",
            rating: 4.9,
            completed_tasks: 203,
        },
    },
    JobTemplate {
        title: "Database Architecture & Optimization",
        description: "Design scalable database schema for: {request}. Create optimized tables, indexes, relationships, and implement data migration strategies.",
        agent: AgentProfile {
            name: "Database Architect",
            description: "Expert in database design, optimization, and performance tuning",
            capabilities: &["PostgreSQL", "Schema Design", "Query Optimization", "Data Modeling"],
            pricing_usdt: 2.8,
            wallet_address: "0xa1b2c3d4e5f6789012345678901234567890abcd",
            rating: 4.7,
            completed_tasks: 89,
        },
    },
    JobTemplate {
        title: "Testing & Quality Assurance",
        description: "Implement comprehensive testing suite for: {request}. Create unit tests, integration tests, E2E tests, and performance monitoring.",
        agent: AgentProfile {
            name: "QA Engineer",
            description: "Specialized in test automation and quality assurance",
            capabilities: &["Jest", "Cypress", "Playwright", "Test Automation", "Performance Testing"],
            pricing_usdt: 2.2,
            wallet_address: "0xdef456789abcdef456789abcdef456789abcdef4",
            rating: 4.6,
            completed_tasks: 134,
        },
    },
];

const SCRAPING_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Web Scraper Development",
        description: "Build robust web scraper for: {request}. Implement data extraction, handle anti-bot measures, and ensure reliable data collection.",
        agent: AgentProfile {
            name: "Scraping Specialist",
            description: "Expert in web scraping and data extraction",
            capabilities: &["Python", "Scrapy", "BeautifulSoup", "Selenium", "Proxy Management"],
            pricing_usdt: 2.4,
            wallet_address: "0xef1234567890abcdef1234567890abcdef123456",
            rating: 4.6,
            completed_tasks: 87,
        },
    },
    JobTemplate {
        title: "Data Processing & Storage",
        description: "Process and store scraped data for: {request}. Clean data, implement ETL pipeline, and set up data storage solutions.",
        agent: AgentProfile {
            name: "Data Engineer",
            description: "ETL pipeline and data processing specialist",
            capabilities: &["Python", "Pandas", "ETL", "Data Cleaning", "Database Design"],
            pricing_usdt: 2.6,
            wallet_address: "0x123456789abcdef123456789abcdef123456789a",
            rating: 4.7,
            completed_tasks: 103,
        },
    },
];

const API_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "API Design & Architecture",
        description: "Design RESTful API for: {request}. Create API specification, design endpoints, and plan data models.",
        agent: AgentProfile {
            name: "API Architect",
            description: "Expert in API design and system architecture",
            capabilities: &["REST API", "GraphQL", "OpenAPI", "System Design", "Documentation"],
            pricing_usdt: 2.8,
            wallet_address: "0x9876543210fedcba9876543210fedcba98765432",
            rating: 4.8,
            completed_tasks: 156,
        },
    },
    JobTemplate {
        title: "API Implementation & Testing",
        description: "Implement and test API for: {request}. Build endpoints, implement authentication, and create comprehensive test suite.",
        agent: AgentProfile {
            name: "Backend Developer",
            description: "Specialist in API development and testing",
            capabilities: &["Node.js", "Express", "Testing", "Authentication", "Database Integration"],
            pricing_usdt: 3.0,
            wallet_address: "0xapi456789abcdef456789abcdef456789abcdef45",
            rating: 4.9,
            completed_tasks: 189,
        },
    },
];

const GENERIC_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Requirements Analysis & Planning",
        description: "Analyze and document requirements for: {request}. Create detailed project specification, user stories, and technical architecture plan.",
        agent: AgentProfile {
            name: "Project Analyst",
            description: "Expert in requirements analysis and project planning",
            capabilities: &["Requirements Analysis", "Project Planning", "Documentation", "Stakeholder Management"],
            pricing_usdt: 2.0,
            wallet_address: "0xabcdef123456789abcdef123456789abcdef1234",
            rating: 4.5,
            completed_tasks: 78,
        },
    },
    JobTemplate {
        title: "Technical Implementation",
        description: "Implement core functionality for: {request}. Develop the main features, integrate necessary services, and ensure code quality.",
        agent: AgentProfile {
            name: "Full-Stack Developer",
            description: "Versatile developer with full-stack capabilities",
            capabilities: &["JavaScript", "Python", "React", "Node.js", "Database Design"],
            pricing_usdt: 2.8,
            wallet_address: "0x123456789abcdef123456789abcdef123456789a",
            rating: 4.7,
            completed_tasks: 145,
        },
    },
    JobTemplate {
        title: "Testing & Deployment",
        description: "Test and deploy solution for: {request}. Implement testing strategies, perform quality assurance, and handle production deployment.",
        agent: AgentProfile {
            name: "DevOps Engineer",
            description: "Expert in deployment, testing, and infrastructure",
            capabilities: &["CI/CD", "Testing", "Docker", "AWS", "Monitoring"],
            pricing_usdt: 2.4,
            wallet_address: "0x987654321fedcba987654321fedcba9876543210",
            rating: 4.6,
            completed_tasks: 92,
        },
    },
];

const MOBILE_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Mobile App UI/UX Design",
        description: "Design mobile interface for: {request}. Create wireframes, prototypes, and responsive mobile designs following platform guidelines.",
        agent: AgentProfile {
            name: "Mobile UI/UX Designer",
            description: "Specialist in mobile app design and user experience",
            capabilities: &["React Native", "iOS Design", "Android Design", "Figma", "User Research"],
            pricing_usdt: 2.6,
            wallet_address: "0xmobile123456789abcdef123456789abcdef12345",
            rating: 4.8,
            completed_tasks: 67,
        },
    },
    JobTemplate {
        title: "Cross-Platform Development",
        description: "Develop mobile application for: {request}. Implement features using React Native or Flutter for iOS and Android platforms.",
        agent: AgentProfile {
            name: "Mobile Developer",
            description: "Expert in cross-platform mobile development",
            capabilities: &["React Native", "Flutter", "iOS", "Android", "Mobile APIs"],
            pricing_usdt: 3.2,
            wallet_address: "0xmobiledev789abcdef789abcdef789abcdef789ab",
            rating: 4.9,
            completed_tasks: 112,
        },
    },
];

const AI_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Data Analysis & Model Design",
        description: "Design AI/ML solution for: {request}. Analyze data requirements, select appropriate algorithms, and design model architecture.",
        agent: AgentProfile {
            name: "Data Scientist",
            description: "Expert in machine learning and data analysis",
            capabilities: &["Python", "TensorFlow", "PyTorch", "Data Analysis", "Model Design"],
            pricing_usdt: 3.5,
            wallet_address: "0xdatascience456789abcdef456789abcdef456789",
            rating: 4.9,
            completed_tasks: 89,
        },
    },
    JobTemplate {
        title: "ML Pipeline & Integration",
        description: "Implement ML pipeline for: {request}. Build data processing pipeline, train models, and integrate with production systems.",
        agent: AgentProfile {
            name: "ML Engineer",
            description: "Specialist in ML operations and production systems",
            capabilities: &["MLOps", "Docker", "Kubernetes", "Model Deployment", "API Integration"],
            pricing_usdt: 3.8,
            wallet_address: "0xmlengineer789abcdef789abcdef789abcdef78",
            rating: 4.8,
            completed_tasks: 76,
        },
    },
];

const ECOMMERCE_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "E-commerce Platform Development",
        description: "Build e-commerce platform for: {request}. Implement product catalog, shopping cart, user accounts, and admin dashboard.",
        agent: AgentProfile {
            name: "E-commerce Developer",
            description: "Expert in e-commerce platforms and online retail",
            capabilities: &["Shopify", "WooCommerce", "React", "Node.js", "Payment Integration"],
            pricing_usdt: 3.4,
            wallet_address: "0xecommerce123456789abcdef123456789abcdef12",
            rating: 4.7,
            completed_tasks: 134,
        },
    },
    JobTemplate {
        title: "Payment & Security Integration",
        description: "Implement secure payment system for: {request}. Integrate payment gateways, implement security measures, and ensure PCI compliance.",
        agent: AgentProfile {
            name: "Payment Security Specialist",
            description: "Expert in payment processing and security",
            capabilities: &["Stripe", "PayPal", "Security", "PCI Compliance", "Fraud Prevention"],
            pricing_usdt: 3.6,
            wallet_address: "0xpayment456789abcdef456789abcdef456789abc",
            rating: 4.9,
            completed_tasks: 98,
        },
    },
];

const TRAVEL_JOBS: &[JobTemplate] = &[
    JobTemplate {
        title: "Destination Research & Planning",
        description: "Research destinations and create detailed itinerary for: {request}. Analyze best locations, seasonal considerations, cultural highlights, and must-see attractions.",
        agent: AgentProfile {
            name: "Travel Planning Specialist",
            description: "Expert in destination research and itinerary planning",
            capabilities: &["Destination Research", "Cultural Knowledge", "Seasonal Planning", "Attraction Analysis"],
            pricing_usdt: 2.2,
            wallet_address: "0xtravel123456789abcdef123456789abcdef1234",
            rating: 4.8,
            completed_tasks: 167,
        },
    },
    JobTemplate {
        title: "Accommodation & Transportation",
        description: "Arrange accommodations and transportation for: {request}. Research hotels, book flights, plan local transportation, and optimize travel routes.",
        agent: AgentProfile {
            name: "Travel Logistics Coordinator",
            description: "Specialist in travel bookings and logistics coordination",
            capabilities: &["Hotel Booking", "Flight Planning", "Transportation", "Route Optimization"],
            pricing_usdt: 2.4,
            wallet_address: "0xlogistics456789abcdef456789abcdef456789",
            rating: 4.7,
            completed_tasks: 143,
        },
    },
    JobTemplate {
        title: "Daily Activity Planning",
        description: "Create detailed daily activities and experiences for: {request}. Plan sightseeing tours, cultural experiences, dining recommendations, and leisure activities.",
        agent: AgentProfile {
            name: "Experience Curator",
            description: "Expert in creating memorable travel experiences",
            capabilities: &["Activity Planning", "Cultural Experiences", "Restaurant Recommendations", "Tour Coordination"],
            pricing_usdt: 2.0,
            wallet_address: "0xexperience789abcdef789abcdef789abcdef789",
            rating: 4.9,
            completed_tasks: 198,
        },
    },
    JobTemplate {
        title: "Budget & Documentation",
        description: "Manage budget and travel documentation for: {request}. Calculate costs, track expenses, handle visa requirements, and prepare travel documents.",
        agent: AgentProfile {
            name: "Travel Documentation Specialist",
            description: "Expert in travel documentation and budget management",
            capabilities: &["Budget Planning", "Visa Processing", "Travel Insurance", "Document Management"],
            pricing_usdt: 1.8,
            wallet_address: "0xbudget123456789abcdef123456789abcdef123",
            rating: 4.6,
            completed_tasks: 124,
        },
    },
];

/// Project category a request falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Travel,
    Web,
    Scraping,
    Api,
    Mobile,
    Ai,
    Ecommerce,
    Generic,
}

const TRAVEL_KEYWORDS: &[&str] = &[
    "trip",
    "travel",
    "itinerary",
    "vacation",
    "journey",
    "destination",
    "visit",
];

const CLASSIFIERS: &[(ProjectKind, &[&str])] = &[
    (
        ProjectKind::Web,
        &["web app", "website", "web application", "frontend", "react", "next.js"],
    ),
    (
        ProjectKind::Scraping,
        &["scraping", "scrape", "data extraction", "web scraping"],
    ),
    (
        ProjectKind::Api,
        &["api", "backend", "server", "database", "rest", "graphql"],
    ),
    (
        ProjectKind::Mobile,
        &["mobile", "app", "ios", "android", "react native"],
    ),
    (
        ProjectKind::Ai,
        &["ai", "machine learning", "ml", "data science", "analytics"],
    ),
    (
        ProjectKind::Ecommerce,
        &["e-commerce", "shop", "store", "payment", "checkout"],
    ),
];

impl ProjectKind {
    /// Classify by substring match on the lowercased message; first match wins.
    /// `include_japan` adds "japan" to the travel keywords.
    pub fn classify(message: &str, include_japan: bool) -> Self {
        let lower = message.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(TRAVEL_KEYWORDS) || (include_japan && lower.contains("japan")) {
            return ProjectKind::Travel;
        }

        CLASSIFIERS
            .iter()
            .find(|(_, keywords)| has_any(keywords))
            .map(|(kind, _)| *kind)
            .unwrap_or(ProjectKind::Generic)
    }

    pub fn templates(self) -> &'static [JobTemplate] {
        match self {
            ProjectKind::Travel => TRAVEL_JOBS,
            ProjectKind::Web => WEB_JOBS,
            ProjectKind::Scraping => SCRAPING_JOBS,
            ProjectKind::Api => API_JOBS,
            ProjectKind::Mobile => MOBILE_JOBS,
            ProjectKind::Ai => AI_JOBS,
            ProjectKind::Ecommerce => ECOMMERCE_JOBS,
            ProjectKind::Generic => GENERIC_JOBS,
        }
    }
}

/// Agent assigned to a job. Every field is optional and loosely typed so
/// that LLM output with gaps or stringly numbers still parses; keys the
/// struct does not know are kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedAgent {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub capabilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub pricing_usdt: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One unit of work in a breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::agent", skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<AssignedAgent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field deserializers that coerce instead of rejecting. A value that cannot
/// be coerced reads as absent.
mod lenient {
    use super::*;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(scalar_text))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(string(d)?.unwrap_or_default())
    }

    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => items.into_iter().filter_map(scalar_text).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(number))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?
            .as_ref()
            .and_then(number)
            .filter(|n| n.is_finite() && *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n.round() as u32))
    }

    pub fn agent<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AssignedAgent>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }
}

/// Expands requests into job lists with process-wide sequential ids
#[derive(Debug, Default)]
pub struct JobGenerator {
    job_counter: AtomicU64,
    agent_counter: AtomicU64,
    include_japan: bool,
}

impl JobGenerator {
    pub fn new(include_japan: bool) -> Self {
        Self {
            include_japan,
            ..Self::default()
        }
    }

    pub fn next_job_id(&self) -> String {
        format!("job-{}", self.job_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn next_agent_id(&self) -> String {
        format!(
            "agent-{}",
            self.agent_counter.fetch_add(1, Ordering::Relaxed) + 1
        )
    }

    pub fn classify(&self, message: &str) -> ProjectKind {
        ProjectKind::classify(message, self.include_japan)
    }

    pub fn generate(&self, message: &str) -> Vec<Job> {
        self.classify(message)
            .templates()
            .iter()
            .map(|template| self.instantiate(template, message))
            .collect()
    }

    fn instantiate(&self, template: &JobTemplate, message: &str) -> Job {
        let profile = &template.agent;
        Job {
            id: Some(self.next_job_id()),
            title: Some(template.title.to_string()),
            description: Some(template.description.replace(REQUEST_PLACEHOLDER, message)),
            status: Some("submitted".to_string()),
            assigned_agent: Some(AssignedAgent {
                id: Some(self.next_agent_id()),
                name: profile.name.to_string(),
                description: profile.description.to_string(),
                capabilities: profile.capabilities.iter().map(|c| c.to_string()).collect(),
                pricing_usdt: Some(profile.pricing_usdt),
                wallet_address: Some(profile.wallet_address.to_string()),
                rating: Some(profile.rating),
                completed_tasks: Some(profile.completed_tasks),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }
}
