//! Reply text builders. Every reply except the state-of-race text ends
//! with [`footer`].

use chrono::{Datelike, NaiveDate};
use planbot_protocol::{Document, PotentialMatch, Verbatim};

/// Suggestions shown in a no-match reply.
pub const MAX_SUGGESTIONS: usize = 8;

const PLAN_LIST_COMMAND: &str = "!WarrenPlanBot show me the plans";
const JOIN_URL: &str = "https://elizabethwarren.com/join-us";
const DELEGATES_AWARDED: u32 = 101;
const TOTAL_PLEDGED_DELEGATES: u32 = 3_979;

#[must_use]
pub fn footer() -> String {
    format!(
        "\n\n\n***\nThis bot was created independently by volunteers. [Join us!]({JOIN_URL}) "
    )
}

/// Line naming the person who asked the bot to answer someone else.
#[must_use]
pub fn parent_reply_prefix(requester: &str) -> String {
    format!("/u/{requester} asked me to chime in!\n\n")
}

fn plan_links<'a>(plans: impl IntoIterator<Item = &'a Document>) -> String {
    plans
        .into_iter()
        .map(|plan| format!("[{}]({})  ", plan.display_title, plan.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn plan_reply(plan: &Document) -> String {
    format!(
        "Senator Warren has a plan for that!\n\n{}\n\nLearn more about her plan: [{}]({}){}",
        plan.summary,
        plan.display_title,
        plan.url,
        footer()
    )
}

#[must_use]
pub fn plan_cluster_reply(cluster: &Document) -> String {
    format!(
        "Senator Warren has quite a number of plans for that!\n\n\
         Learn more about her plans for {}:\n\n{}{}",
        cluster.display_title,
        plan_links(&cluster.members),
        footer()
    )
}

/// Generated text gets the same footer as the static replies.
#[must_use]
pub fn enriched_reply(generated: &str) -> String {
    format!("{generated}{}", footer())
}

#[must_use]
pub fn verbatim_reply(verbatim: &Verbatim) -> String {
    format!("{}{}", verbatim.text, footer())
}

/// "Did you mean" reply listing up to [`MAX_SUGGESTIONS`] candidates, or a
/// request to rephrase when there are none.
#[must_use]
pub fn no_match_reply(potential_matches: &[PotentialMatch]) -> String {
    let suggestions: Vec<&Document> = potential_matches
        .iter()
        .filter_map(|m| m.document.as_ref())
        .take(MAX_SUGGESTIONS)
        .collect();

    if suggestions.is_empty() {
        format!(
            "I'm not sure exactly which plan you're looking for, \
             and I'm not feeling confident enough in any of my guesses to tell you about them! ':(\n\n\
             I can show you my full list of her plans if you reply with\n\n\
             ```{PLAN_LIST_COMMAND}```\n\n\
             Or please kindly rephrase? ':D{}",
            footer()
        )
    } else {
        format!(
            "I'm not sure I have an exact match for you! \
             Here are the plans that seem most relevant:\n\n{}\n\n\
             Or I can show you my full list of her plans if you reply with\n\n\
             ```{PLAN_LIST_COMMAND}```\n\n{}",
            plan_links(suggestions),
            footer()
        )
    }
}

/// Three-column markdown table of every non-cluster plan.
#[must_use]
pub fn all_plans_reply(documents: &[Document]) -> String {
    let pure: Vec<&Document> = documents.iter().filter(|doc| !doc.is_cluster).collect();
    let mut response =
        String::from("Here's the full list of plans Sen. Warren has released that I know about:\n\n");
    for (row, plans) in pure.chunks(3).enumerate() {
        for plan in plans {
            response.push_str(&format!("|[{}]({})", plan.display_title, plan.url));
        }
        response.push_str("|\n");
        if row == 0 {
            response.push_str("|:-:|:-:|:-:|\n");
        }
    }
    response.push_str("\n\n");
    response.push_str(&footer());
    response
}

fn day_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

#[must_use]
pub fn state_of_race_reply(today: NaiveDate) -> String {
    let cutoff = NaiveDate::from_ymd_opt(2020, 3, 6).unwrap_or(NaiveDate::MIN);
    if today > cutoff {
        return "rip.".to_string();
    }

    let left = (1.0 - f64::from(DELEGATES_AWARDED) / f64::from(TOTAL_PLEDGED_DELEGATES)) * 100.0;
    let day = today.day();
    format!(
        "As of {} {day}{}, only {DELEGATES_AWARDED} out of 3,979 total delegates have been \
         awarded in the primary. That means {}% of the delegates are still up for grabs!\n\n\
         [Be part of Warren’s surge in support!]({JOIN_URL})",
        today.format("%b"),
        day_suffix(day),
        left.round()
    )
}
