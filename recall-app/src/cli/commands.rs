use crate::cli::opts::*;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, TimeZone, Utc};
use recall_core::calendar::{local_date, to_local};
use recall_core::{
    compute_next_review_in, daily_streak, days_until_due, due_queue, mastery_summary, summarize,
    ItemId, ItemKind, ItemRecord, MasteryLevel, RecordedReview, ReviewService, ReviewStore,
};
use recall_json::{paths, JsonStore};
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    match args.tz.as_deref() {
        Some(name) => {
            let tz: chrono_tz::Tz = name
                .parse()
                .map_err(|e| anyhow!("unknown time zone {name}: {e}"))?;
            run_in(args, tz).await
        }
        None => run_in(args, Local).await,
    }
}

async fn run_in<Z>(args: Cli, tz: Z) -> Result<()>
where
    Z: TimeZone + Send + Sync + 'static,
    Z::Offset: Display,
{
    if let Command::Preview(p) = &args.cmd {
        return preview_cmd(&tz, p, args.json);
    }

    let store = open_store(&args).await?;
    let svc = ReviewService::new(store, tz);
    match args.cmd.clone() {
        Command::Item(cmd) => item_cmd(&svc, cmd, args.json).await,
        Command::Review(cmd) => review_cmd(&svc, cmd, args.json).await,
        Command::Due(cmd) => due_cmd(&svc, cmd, args.json).await,
        Command::Stats(cmd) => stats_cmd(&svc, cmd, args.json).await,
        Command::Preview(_) => unreachable!(),
    }
}

pub async fn open_store(args: &Cli) -> Result<Arc<dyn ReviewStore>> {
    let file = args
        .data_file
        .clone()
        .unwrap_or_else(paths::default_store_file);
    let backups = paths::backups_dir_for(&file);
    info!(file = %file.display(), "opening store");
    let s = JsonStore::open_with(file, backups, args.max_backups).await?;
    Ok(Arc::new(s))
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_time<Z>(ms: i64, tz: &Z) -> String
where
    Z: TimeZone,
    Z::Offset: Display,
{
    match to_local(ms, tz) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M %Z").to_string(),
        None => ms.to_string(),
    }
}

async fn item_cmd<Z>(svc: &ReviewService<Z>, cmd: ItemCmd, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let store = svc.store();
    match cmd {
        ItemCmd::Add { kind, label } => {
            let label = label.trim();
            if label.is_empty() {
                bail!("label must not be empty");
            }
            let item = store.add_item(kind.into(), label).await?;
            if json {
                print_json(&item)?;
            } else {
                println!("{}", item.id);
            }
        }
        ItemCmd::List { kind } => {
            let mut items = store.list_items(kind.map(ItemKind::from)).await?;
            items.sort_by_key(|i| i.created_at);
            if json {
                return print_json(&items);
            }
            for i in items {
                println!(
                    "{}\t{}\t{}\tstage={}\tdue={}",
                    i.id,
                    i.kind.as_str(),
                    i.label,
                    i.state.review_stage,
                    if i.state.is_new() { "new".to_string() } else { fmt_time(i.state.next_review_time, svc.tz()) }
                );
            }
        }
        ItemCmd::Show { item_id } => {
            let item = store.get_item(parse_id(&item_id)?).await?;
            let view = ItemView::new(&item, now_ms());
            if json {
                return print_json(&view);
            }
            let s = &item.state;
            println!("{}\t{}\t{}", item.id, item.kind.as_str(), item.label);
            println!("ease={:.2} interval={}d repetition={}", s.ease_factor, s.interval_days, s.repetition);
            println!("stage={} ({:?}) status={:?}", s.review_stage, view.mastery, view.status);
            if !s.is_new() {
                println!("next review {} ({} day(s))", fmt_time(s.next_review_time, svc.tz()), view.days_until_due);
                println!("first learned {}", fmt_time(s.first_learn_date, svc.tz()));
            }
            println!("correct={} wrong={}", s.correct_count, s.wrong_count);
        }
        ItemCmd::Rm { item_id } => {
            svc.delete_item(parse_id(&item_id)?).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn review_cmd<Z>(svc: &ReviewService<Z>, cmd: ReviewArgs, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let id = parse_id(&cmd.item_id)?;
    let now = now_ms();
    let out: RecordedReview = match (cmd.quality, cmd.correct, cmd.wrong) {
        (Some(q), _, _) => svc.record_score(id, q, now).await?,
        (None, true, _) => svc.record_outcome(id, true, cmd.attempts, now).await?,
        (None, _, true) => svc.record_outcome(id, false, cmd.attempts, now).await?,
        (None, false, false) => bail!("give --quality N, --correct or --wrong"),
    };

    if json {
        return print_json(&out.result);
    }
    println!(
        "{} quality={} ({})",
        out.item.label,
        out.log.quality.as_score(),
        out.log.quality.label()
    );
    println!(
        "→ next due in {} day(s) at {} (ease {:.2}, repetition {})",
        out.result.next_interval,
        fmt_time(out.result.next_review_time, svc.tz()),
        out.result.ease_factor,
        out.result.repetition
    );
    Ok(())
}

async fn due_cmd<Z>(svc: &ReviewService<Z>, cmd: DueArgs, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let now = now_ms();
    let items = svc.store().list_items(cmd.kind.map(ItemKind::from)).await?;
    let queue = due_queue(&items, now, cmd.include_new, Some(cmd.max));

    if json {
        let views: Vec<ItemView> = queue.iter().map(|i| ItemView::new(i, now)).collect();
        return print_json(&views);
    }
    if queue.is_empty() {
        println!("nothing due");
        return Ok(());
    }
    for i in &queue {
        let when = if i.state.is_new() {
            "new".to_string()
        } else {
            fmt_time(i.state.next_review_time, svc.tz())
        };
        println!("{}\t{}\t{}\t{}", i.id, i.kind.as_str(), i.label, when);
    }
    println!("\n{} due", queue.len());
    Ok(())
}

async fn stats_cmd<Z>(svc: &ReviewService<Z>, cmd: StatsArgs, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let items = svc.store().list_items(cmd.kind.map(ItemKind::from)).await?;
    let ids: std::collections::HashSet<ItemId> = items.iter().map(|i| i.id).collect();
    let mut logs = svc.store().list_reviews().await?;
    logs.retain(|r| ids.contains(&r.item_id));

    let tz = svc.tz();
    let mastery = mastery_summary(&items);
    let summary = summarize(&logs, tz);
    let streak = match local_date(now_ms(), tz) {
        Some(today) => daily_streak(&logs, today, tz),
        None => 0,
    };

    if json {
        #[derive(Serialize)]
        struct StatsOut<'a> {
            mastery: &'a recall_core::MasterySummary,
            reviews: &'a recall_core::StatsSummary,
            streak: u32,
        }
        return print_json(&StatsOut { mastery: &mastery, reviews: &summary, streak });
    }

    println!(
        "items={} new={} learning={} reviewing={} mastered={} ({:.0}%)",
        mastery.items,
        mastery.new,
        mastery.learning,
        mastery.reviewing,
        mastery.mastered,
        mastery.mastered_share() * 100.0
    );
    println!(
        "reviews={} lapses={} accuracy={:.0}% streak={} day(s)",
        summary.totals.total,
        summary.totals.lapses(),
        summary.totals.accuracy() * 100.0,
        streak
    );
    for (day, t) in summary.per_day.iter().rev().take(7) {
        println!("{day}\t{}\t{:.0}%", t.total, t.accuracy() * 100.0);
    }
    Ok(())
}

fn preview_cmd<Z>(tz: &Z, p: &PreviewArgs, json: bool) -> Result<()>
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let r = compute_next_review_in(tz, p.quality, p.ease, p.interval, p.repetition, now_ms())?;
    if json {
        return print_json(&r);
    }
    println!(
        "interval={}d ease={:.2} repetition={} next={}",
        r.next_interval,
        r.ease_factor,
        r.repetition,
        fmt_time(r.next_review_time, tz)
    );
    Ok(())
}

// ===== Helpers =====
fn parse_id(s: &str) -> Result<ItemId> {
    Uuid::parse_str(s).map_err(|_| anyhow!("invalid item id: {s}"))
}

#[derive(Serialize)]
struct ItemView<'a> {
    #[serde(flatten)]
    item: &'a ItemRecord,
    status: recall_core::DueStatus,
    mastery: MasteryLevel,
    days_until_due: i64,
}

impl<'a> ItemView<'a> {
    fn new(item: &'a ItemRecord, now: i64) -> Self {
        Self {
            item,
            status: item.state.due_status(now),
            mastery: MasteryLevel::of(&item.state),
            days_until_due: days_until_due(item.state.next_review_time, now),
        }
    }
}
