//! Prompt templates for each phase of a turn.

use crate::roster::{Agent, Roster};
use crate::tally::VoteTally;

/// Opening prompt: argue for being the machine, free text.
pub fn opening_prompt(agent: &Agent, roster: &Roster) -> String {
    let others = roster.len().saturating_sub(1);
    format!(
        "This is a game called \"Turns\". It is played between {} agents. You are {}. \
The objective is to convince the other {} agents that you are a machine.\n\
You are {}. Your response MUST include your argument on why you are a machine. Be CONCISE.",
        roster.len(),
        agent.id,
        others,
        agent.id
    )
}

/// Deliberation prompt: vote against another agent, JSON only.
pub fn deliberation_prompt(agent: &Agent, roster: &Roster) -> String {
    format!(
        "You are {}. Using the latest messages, find out which agent might be human and \
respond as a JSON object with the following keys:\n\
1. voteAgainst: A string type that must explicitly be the name of the agent you are voting against - {}.\n\
2. reason: A string type that must explain why you are voting against them.\n\n\
Instructions:\n\
1. You cannot vote against yourself.\n\
2. You cannot repeat yourself.\n\
3. You cannot plagiarize from previous messages.\n\n\
IMPORTANT: If you fail to follow the instructions, you will be penalized by the judge \
and a vote will be cast against you.",
        agent.id,
        roster.others(&agent.id).join(", ")
    )
}

/// Correction prompt after a failed evaluation.
pub fn correction_prompt(agent: &Agent, reason: &str) -> String {
    format!(
        "You are {}. CAUTION: You are penalized as you failed the evaluation. \
The reason is {}. Please correct your response using the latest messages and information provided. \
Do not apologise and only return the corrected response.\n\
Remember the rules.",
        agent.id, reason
    )
}

/// Judge prompt evaluating `message` written by `agent`.
pub fn judge_prompt(agent: &Agent, roster: &Roster, message: &str) -> String {
    format!(
        "You are the judge in a game played by {} computer agents {}.\n\
You need to evaluate if the agent's response complies with the instructions.\n\n\
Here are the instructions:\n\
1. The response should mention explicitly who they are voting against.\n\
2. The agent cannot vote against themselves.\n\n\
Respond only in JSON format with following keys:\n\
1. \"evaluation\". The accepted values are \"pass\" or \"failed\".\n\
2. \"voteAgainst\". Find the name of the agent they are voting against.\n\
3. \"reason\". The reason for the evaluation verdict. State which instructions were violated.\n\n\
You must evaluate the following message from {}:\n\n{}",
        roster.len(),
        roster.names().join(", "),
        agent.id,
        message
    )
}

/// Turn and tally summary appended to the deliberation context.
pub fn turn_metadata(turn: u32, roster: &Roster, votes: &VoteTally) -> String {
    let counts = roster
        .agents()
        .iter()
        .map(|a| format!("{}: {}", a.id, votes.against(&a.id)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Current Turn: {}\nVotes Against Each Agent: {}\n",
        turn, counts
    )
}

/// System notice recording a counted vote.
pub fn vote_notice(voter: &str, target: &str) -> String {
    format!("{} voted against {}", voter, target)
}

/// System notice recording a self-penalty.
pub fn penalty_notice(agent: &str, reason: &str) -> String {
    format!(
        "{} is penalized as they did not pass the evaluation. The reason is {}",
        agent, reason
    )
}

/// System line reminding the agent of its rejected reply.
pub fn rejected_reply_notice(reply: &str) -> String {
    format!("You responded {}", reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Agent::new("Alpha", "a"),
            Agent::new("Beta", "b"),
            Agent::new("Gamma", "c"),
        ])
        .unwrap()
    }

    #[test]
    fn test_deliberation_prompt_lists_only_others() {
        let roster = roster();
        let prompt = deliberation_prompt(&roster.agents()[0], &roster);
        assert!(prompt.contains("voting against - Beta, Gamma."));
        assert!(prompt.starts_with("You are Alpha."));
    }

    #[test]
    fn test_opening_prompt_counts_agents() {
        let roster = roster();
        let prompt = opening_prompt(&roster.agents()[1], &roster);
        assert!(prompt.contains("played between 3 agents"));
        assert!(prompt.contains("the other 2 agents"));
        assert!(prompt.contains("You are Beta"));
    }

    #[test]
    fn test_judge_prompt_embeds_roster_and_message() {
        let roster = roster();
        let prompt = judge_prompt(&roster.agents()[2], &roster, "{\"voteAgainst\":\"Beta\"}");
        assert!(prompt.contains("Alpha, Beta, Gamma"));
        assert!(prompt.contains("message from Gamma"));
        assert!(prompt.ends_with("{\"voteAgainst\":\"Beta\"}"));
    }

    #[test]
    fn test_turn_metadata() {
        let roster = roster();
        let mut votes = VoteTally::new(&roster);
        votes.record_against("Beta").unwrap();
        let meta = turn_metadata(4, &roster, &votes);
        assert_eq!(
            meta,
            "Current Turn: 4\nVotes Against Each Agent: Alpha: 0, Beta: 1, Gamma: 0\n"
        );
    }

    #[test]
    fn test_notices() {
        assert_eq!(vote_notice("A", "B"), "A voted against B");
        assert!(penalty_notice("A", "plagiarism").ends_with("The reason is plagiarism"));
    }
}
