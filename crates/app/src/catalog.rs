//! Non-interactive commands over the question bank.

use std::collections::HashMap;

use anyhow::anyhow;
use mindlock_core::model::{
    Course, CourseDraft, CourseId, Question, QuestionDraft, QuestionFilter, QuestionId,
    QuestionPatch, QuestionSort, TagName,
};

use crate::context::AppContext;

const UNKNOWN_COURSE: &str = "Unknown Course";

pub async fn list_questions(
    ctx: &AppContext,
    filter: &QuestionFilter,
    sort: QuestionSort,
) -> anyhow::Result<()> {
    let questions = ctx.questions().list(filter, sort).await?;
    let names: HashMap<CourseId, String> = ctx
        .courses()
        .list()
        .await?
        .into_iter()
        .map(|course| (course.id().clone(), course.name().to_string()))
        .collect();

    if questions.is_empty() {
        println!("No questions match.");
        return Ok(());
    }
    for question in &questions {
        let course = names
            .get(&question.course_id)
            .map_or(UNKNOWN_COURSE, String::as_str);
        println!("{}", question_line(question, course));
    }
    println!("{} question(s)", questions.len());
    Ok(())
}

fn question_line(question: &Question, course: &str) -> String {
    let tags: Vec<&str> = question.tags.iter().map(TagName::as_str).collect();
    let mut line = format!(
        "{:<10} {:<8} {:<28} {}",
        question.id.as_str(),
        question.difficulty.label(),
        course,
        question.title
    );
    if !tags.is_empty() {
        line.push_str(&format!("  #{}", tags.join(" #")));
    }
    if question.user_answer.is_some() {
        line.push_str("  (answered)");
    }
    line
}

pub async fn add_question(ctx: &AppContext, draft: QuestionDraft) -> anyhow::Result<()> {
    let question = ctx.questions().create(draft).await?;
    println!("Created question {}", question.id);
    Ok(())
}

pub async fn edit_question(
    ctx: &AppContext,
    id: &QuestionId,
    patch: QuestionPatch,
) -> anyhow::Result<()> {
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    let question = ctx.questions().update(id, patch).await?;
    println!("Updated question {}: {}", question.id, question.title);
    Ok(())
}

pub async fn delete_question(ctx: &AppContext, id: &QuestionId) -> anyhow::Result<()> {
    ctx.questions().delete(id).await?;
    println!("Deleted question {id}");
    Ok(())
}

pub async fn list_tags(ctx: &AppContext) -> anyhow::Result<()> {
    for tag in ctx.questions().tags().await? {
        println!("{tag}");
    }
    Ok(())
}

/// Dashboard view: one line per course with its question count and workload.
pub async fn list_courses(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.courses().stats().await?;
    if stats.is_empty() {
        println!("No courses yet. Run `mindlock seed` for sample data.");
        return Ok(());
    }
    for entry in stats {
        println!(
            "{:<10} {:<28} {:>3} question(s)  ~{} min",
            entry.course.id().as_str(),
            entry.course.name(),
            entry.question_count,
            entry.estimated_minutes
        );
        if let Some(description) = entry.course.description() {
            println!("           {description}");
        }
    }
    Ok(())
}

pub async fn add_course(ctx: &AppContext, draft: CourseDraft) -> anyhow::Result<()> {
    let course = ctx.courses().create(draft).await?;
    println!("Created course {} ({})", course.id(), course.name());
    Ok(())
}

/// `draft` builds the new name and description from the stored course.
pub async fn edit_course(
    ctx: &AppContext,
    id: &CourseId,
    draft: impl FnOnce(&Course) -> CourseDraft,
) -> anyhow::Result<()> {
    let courses = ctx.courses();
    let current = courses
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("course {id} not found"))?;
    let course = courses.update(id, draft(&current)).await?;
    println!("Updated course {} ({})", course.id(), course.name());
    Ok(())
}

pub async fn delete_course(ctx: &AppContext, id: &CourseId) -> anyhow::Result<()> {
    ctx.courses().delete(id).await?;
    println!("Deleted course {id}");
    Ok(())
}

pub async fn history(ctx: &AppContext, limit: u32) -> anyhow::Result<()> {
    let rows = ctx.exams().recent_records(limit).await?;
    if rows.is_empty() {
        println!("No exams taken yet.");
        return Ok(());
    }
    for row in rows {
        let record = &row.record;
        println!(
            "#{:<4} {}  {:<10} {:<8} {}/{} answered  {}s of {}s  ({})",
            row.id,
            record.submitted_at().format("%Y-%m-%d %H:%M"),
            record.course_id().as_str(),
            record.difficulty().label(),
            record.answered_count(),
            record.question_ids().len(),
            record.elapsed_secs(),
            record.budget_secs(),
            record.reason().as_str()
        );
    }
    Ok(())
}
