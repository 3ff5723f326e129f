//! `fixtures` command - show the corpus and queries

use anyhow::Result;

use super::{CommonArgs, Setup};

pub fn execute(common: &CommonArgs) -> Result<()> {
    let setup = Setup::resolve(common)?;
    let fixtures = &setup.fixtures;

    println!("📄 Corpus ({} documents)", fixtures.corpus_count());
    for doc in &fixtures.documents {
        println!("   {:>3}. {}", doc.id, doc.text);
    }

    println!();
    println!("❓ Queries ({})", fixtures.query_count());
    for category in fixtures.categories() {
        println!("   [{}]", category);
        for query in fixtures.queries.iter().filter(|q| q.category == category) {
            println!("      \"{}\" → expected {:?}", query.text, query.expected_top_k);
        }
    }

    Ok(())
}
