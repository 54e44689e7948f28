use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use brigade_core::{
    complete_quest, resolve_catalog, sync_catalog, Attribute, BrigadeError, ProfileStore,
    QuestCatalog, RankTable, SqliteStorage,
};

#[derive(Parser)]
#[command(name = "brigade", version, about = "Culinary RPG progress tracker")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = "brigade.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the overall rank standing
    Profile,
    /// Show per-attribute progress
    Attributes,
    /// List quests (available by default)
    Quests {
        /// Show every quest in the catalog with its status
        #[arg(long)]
        all: bool,
        /// Show completed quests only
        #[arg(long)]
        completed: bool,
    },
    /// Complete a quest and collect its rewards
    Complete {
        /// Quest id
        id: String,
    },
    /// Grant practice hours to one attribute directly
    AddHours {
        /// Attribute name (technique, ingredients, flavor, management)
        attribute: String,
        /// Hours to add
        hours: f64,
    },
    /// Show the recent achievement log
    Achievements,
    /// Show lifetime milestone counters
    Milestones,
    /// Show the rank ladder
    Ranks,
    /// Import a quest catalog JSON file into the local cache
    Sync {
        /// Path to a catalog JSON file
        file: PathBuf,
    },
    /// Discard all progress and start over
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> brigade_core::Result<()> {
    match cli.command {
        Commands::Profile => cmd_profile(&cli.db),
        Commands::Attributes => cmd_attributes(&cli.db),
        Commands::Quests { all, completed } => cmd_quests(&cli.db, all, completed),
        Commands::Complete { id } => cmd_complete(&cli.db, &id),
        Commands::AddHours { attribute, hours } => cmd_add_hours(&cli.db, &attribute, hours),
        Commands::Achievements => cmd_achievements(&cli.db),
        Commands::Milestones => cmd_milestones(&cli.db),
        Commands::Ranks => cmd_ranks(),
        Commands::Sync { file } => cmd_sync(&cli.db, &file),
        Commands::Reset { yes } => cmd_reset(&cli.db, yes),
    }
}

fn open_store(db_path: &str) -> brigade_core::Result<ProfileStore<SqliteStorage>> {
    ProfileStore::open(SqliteStorage::open(db_path)?)
}

fn catalog_for(store: &ProfileStore<SqliteStorage>) -> brigade_core::Result<QuestCatalog> {
    resolve_catalog(store.storage())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cmd_profile(db_path: &str) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let profile = store.load()?;

    println!("=== {} ===", profile.current_rank.title);
    println!("Tier:           {}", profile.current_rank.color_tier);
    println!("Level:          {}", profile.current_rank.level);
    println!("Rank progress:  {:.1}%", profile.current_rank.progress);
    println!();
    println!("Quests done:    {}", profile.milestones.quests_completed);
    println!("Hours earned:   {:.1}", profile.milestones.hours_accumulated);

    Ok(())
}

fn cmd_attributes(db_path: &str) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let profile = store.load()?;

    let mut table = new_table();
    table.set_header(vec![
        "Attribute", "Rank", "Level", "Level %", "Rank %", "Total Hours", "Status",
    ]);

    for (attribute, progress) in profile.attributes.iter() {
        let status = if progress.waiting_for_rank_up {
            "waiting for rank up"
        } else if progress.is_maxed {
            "maxed"
        } else {
            ""
        };
        table.add_row(vec![
            attribute.as_str().to_string(),
            progress.current_rank.clone(),
            progress.current_level.to_string(),
            format!("{:.1}", progress.level_progress),
            format!("{:.1}", progress.rank_progress),
            format!("{:.1}", progress.total_hours),
            status.to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn cmd_quests(db_path: &str, all: bool, completed: bool) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let catalog = catalog_for(&store)?;
    let profile = store.load()?.clone();

    let mut table = new_table();

    if all {
        table.set_header(vec!["Id", "Title", "Kind", "Rank", "Status"]);
        for quest in catalog.iter() {
            let status = if profile.has_completed(&quest.id) {
                "completed"
            } else if profile.has_unlocked(&quest.id) {
                "available"
            } else {
                "locked"
            };
            table.add_row(vec![
                quest.id.clone(),
                quest.title.clone(),
                quest.kind.to_string(),
                format!("{} {}", quest.rank.title, quest.rank.level),
                status.to_string(),
            ]);
        }
        println!("All quests ({}):", catalog.len());
    } else if completed {
        table.set_header(vec!["Id", "Title", "Kind"]);
        for id in &profile.completed_quests {
            if let Some(quest) = catalog.find_by_id(id) {
                table.add_row(vec![
                    quest.id.clone(),
                    quest.title.clone(),
                    quest.kind.to_string(),
                ]);
            } else {
                table.add_row(vec![id.clone(), "(not in catalog)".into(), String::new()]);
            }
        }
        println!("Completed quests ({}):", profile.completed_quests.len());
    } else {
        let available = store.available_quests(&catalog)?;
        if available.is_empty() {
            println!("No quests available. Try 'brigade quests --all'.");
            return Ok(());
        }
        table.set_header(vec!["Id", "Title", "Kind", "Rank", "Rewards"]);
        for quest in &available {
            let rewards: Vec<String> = quest
                .rewards
                .iter()
                .map(|(a, h)| format!("{} +{:.0}", a, h))
                .collect();
            table.add_row(vec![
                quest.id.clone(),
                quest.title.clone(),
                quest.kind.to_string(),
                format!("{} {}", quest.rank.title, quest.rank.level),
                rewards.join(", "),
            ]);
        }
        println!("Available quests ({}):", available.len());
    }

    println!("{table}");
    Ok(())
}

fn cmd_complete(db_path: &str, id: &str) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let catalog = catalog_for(&store)?;

    let outcome = complete_quest(&mut store, &catalog, id)?;
    if !outcome.success {
        println!("{}", outcome.message);
        return Ok(());
    }

    println!("{}", outcome.message);
    if let Some(rewards) = &outcome.rewards {
        for (attribute, hours) in rewards {
            println!("  {} +{:.1} hours", attribute, hours);
        }
    }
    if outcome.rank_up {
        if let Some(rank) = &outcome.new_rank {
            println!("  Rank up: {}", rank);
        }
    } else if outcome.level_up {
        if let Some(level) = outcome.new_level {
            println!("  Level up: {}", level);
        }
    }

    Ok(())
}

fn cmd_add_hours(db_path: &str, attribute: &str, hours: f64) -> brigade_core::Result<()> {
    let attribute = Attribute::parse(attribute)
        .ok_or_else(|| BrigadeError::Data(format!("Unknown attribute '{}'", attribute)))?;

    let mut store = open_store(db_path)?;
    let outcome = store.update_attribute_hours(attribute, hours)?;
    store.save()?;

    println!("{}", outcome);
    let progress = store.profile()?.attributes.get(attribute);
    println!(
        "{}: {} level {} ({:.1} total hours)",
        attribute, progress.current_rank, progress.current_level, progress.total_hours
    );

    Ok(())
}

fn cmd_achievements(db_path: &str) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let profile = store.load()?;

    if profile.recent_achievements.is_empty() {
        println!("No achievements yet. Complete a quest first.");
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(vec!["When", "Kind", "Achievement"]);
    for achievement in &profile.recent_achievements {
        table.add_row(vec![
            achievement.earned_at().format("%Y-%m-%d %H:%M").to_string(),
            achievement.kind_str().to_string(),
            achievement.describe(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn cmd_milestones(db_path: &str) -> brigade_core::Result<()> {
    let mut store = open_store(db_path)?;
    let milestones = &store.load()?.milestones;

    println!("Quests completed:  {}", milestones.quests_completed);
    println!("Hours accumulated: {:.1}", milestones.hours_accumulated);
    println!("Rank advances:     {}", milestones.rank_advances);
    println!("Level ups:         {}", milestones.level_ups);

    Ok(())
}

fn cmd_ranks() -> brigade_core::Result<()> {
    let table_data = RankTable::bundled()?;

    let mut table = new_table();
    table.set_header(vec!["#", "Rank", "Tier", "Levels", "Hours per Attribute"]);
    for (i, rank) in table_data.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            rank.title.clone(),
            rank.color_tier.clone(),
            rank.level_count().to_string(),
            format!("{:.0}", rank.hours_required()),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn cmd_sync(db_path: &str, file: &PathBuf) -> brigade_core::Result<()> {
    let json = std::fs::read(file)
        .map_err(|e| BrigadeError::Data(format!("Failed to read '{}': {}", file.display(), e)))?;

    let mut store = open_store(db_path)?;
    let catalog = sync_catalog(store.storage_mut(), &json)?;

    println!("Synced {} quests into the local catalog cache.", catalog.len());
    Ok(())
}

fn cmd_reset(db_path: &str, yes: bool) -> brigade_core::Result<()> {
    if !yes {
        eprint!("This will delete all progress in '{}'. Continue? [y/N] ", db_path);
        let _ = io::stderr().flush();
        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| BrigadeError::Data(format!("Failed to read input: {}", e)))?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut store = open_store(db_path)?;
    let profile = store.reset()?;
    println!(
        "Profile reset: {} level {}, all attributes at 0 hours.",
        profile.current_rank.title, profile.current_rank.level
    );

    Ok(())
}
