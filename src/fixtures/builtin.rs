//! Built-in fixture set: 20 contact profiles and annotated queries.
//!
//! Changing the number of documents or queries invalidates cached baselines;
//! editing text in place does not, so bump a count or pass
//! `--regenerate-baseline` after content edits.

use super::{Document, Query};

const PROFILES: [&str; 20] = [
    "Sarah Chen - Senior Frontend Developer at Stripe. Specializes in React, TypeScript and design systems. Based in San Francisco.",
    "Marcus Johnson - Backend Engineer at Shopify. Builds scalable APIs with Go and PostgreSQL. Kubernetes enthusiast.",
    "Emma Dubois - Full-stack JavaScript developer. React, Node.js and Next.js freelancer based in Paris.",
    "David Kim - Product Manager at Notion. Previously led growth teams. Passionate about user research.",
    "Priya Patel - Data Scientist at Spotify. Machine learning, Python and recommendation systems.",
    "Lucas Martin - UX/UI Designer. Figma expert, design systems and mobile app interfaces. Lyon, France.",
    "Aisha Bello - DevOps Engineer at Datadog. AWS, Terraform, CI/CD pipelines and observability.",
    "Tom Becker - Startup founder and CEO of a fintech company. Raised a Series A. Angel investor.",
    "Sofia Rossi - Marketing Director at L'Oreal. Brand strategy, social media campaigns and influencer partnerships.",
    "James O'Connor - iOS Developer. Swift and SwiftUI, published 12 apps on the App Store.",
    "Yuki Tanaka - Machine Learning Engineer. PyTorch, NLP, large language models and embeddings.",
    "Olivia Brown - Sales Manager at Salesforce. Enterprise B2B sales, CRM and account management.",
    "Hugo Laurent - Frontend engineer at Doctolib in Paris. Vue.js and React, web performance and accessibility.",
    "Fatima Zahra - Technical Recruiter at Google. Hiring engineers for teams across Europe.",
    "Ben Carter - Android Developer. Kotlin, Jetpack Compose and mobile architecture.",
    "Chloe Bernard - Lawyer specializing in startup law, fundraising and intellectual property.",
    "Ravi Shankar - Cloud Architect at Microsoft. Azure, distributed systems and security.",
    "Nina Petrov - Photographer and content creator. Weddings, portraits and brand photography.",
    "Alex Rivera - Blockchain developer. Solidity, Ethereum smart contracts and DeFi protocols.",
    "Lea Moreau - Data Analyst. SQL, Tableau and business intelligence dashboards.",
];

/// (query, expected top-k ids, category)
const QUERIES: [(&str, &[u32], &str); 16] = [
    ("React frontend developer", &[1, 3, 13], "role"),
    ("mobile app developer", &[10, 15, 6], "role"),
    ("designer for my app", &[6, 1, 10], "role"),
    ("someone to hire engineers", &[14], "role"),
    ("machine learning expert", &[11, 5, 20], "skill"),
    ("cloud infrastructure and devops", &[7, 17, 2], "skill"),
    ("python data analysis", &[5, 20, 11], "skill"),
    ("smart contracts", &[19], "skill"),
    ("someone who can help me raise money", &[8, 16, 4], "semantic"),
    ("grow my brand on instagram", &[9, 18], "semantic"),
    ("who works at Stripe", &[1], "company"),
    ("people based in Paris", &[3, 13], "location"),
    ("développeur frontend", &[13, 3, 1], "multilingual"),
    ("reakt develper", &[1, 3, 13], "edge_typo"),
    ("marketng stratgy", &[9, 12, 4], "edge_typo"),
    ("androd kotln", &[15, 10], "edge_typo"),
];

pub(super) fn documents() -> Vec<Document> {
    PROFILES
        .iter()
        .enumerate()
        .map(|(pos, text)| Document {
            id: pos as u32 + 1,
            text: text.to_string(),
        })
        .collect()
}

pub(super) fn queries() -> Vec<Query> {
    QUERIES
        .iter()
        .map(|(text, expected, category)| Query {
            text: text.to_string(),
            expected_top_k: expected.to_vec(),
            category: category.to_string(),
        })
        .collect()
}
