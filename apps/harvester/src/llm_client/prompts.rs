// Prompt constants for compatibility scoring.
// Each consumer builds its user prompt from the template below; the
// placeholders are filled with build_match_score_prompt.

/// System prompt for the match-score call.
pub const MATCH_SCORE_SYSTEM: &str = "You are a world-class Job Analyst. \
    You can see the jobs and people behind the resumes, and can understand \
    whether or not a given job and person would be a good match.";

/// User prompt template for the match-score call. The model is asked to
/// reason inside <scratchpad>, justify inside <justification>, and emit
/// the final percentage inside <match_score> tags.
const MATCH_SCORE_TEMPLATE: &str = r#"You are an AI assistant tasked with creating a "Match Score" between a user's description of their resume and a job posting. Your goal is to analyze both inputs and determine how well the candidate's qualifications align with the job requirements.

First, carefully read the following resume description:

<resume_description>
{resume}
</resume_description>

Now, read the job posting:

<job_posting>
{job_posting}
</job_posting>

To create an accurate Match Score, follow these steps:

1. Analyze the job posting to identify key requirements, skills, and qualifications.
2. Compare these requirements to the information provided in the resume description.
3. Consider both hard skills (technical abilities, certifications, etc.) and soft skills (communication, teamwork, etc.) mentioned in both the resume and job posting.
4. Evaluate the level of experience required in the job posting and compare it to the candidate's experience level.
5. Look for any specific achievements or accomplishments in the resume that directly relate to the job requirements.

Before providing your final Match Score, use the <scratchpad> tags to think through your analysis and comparison. Consider the strengths and weaknesses of the match, and any areas where the candidate exceeds or falls short of the job requirements.

<scratchpad>
[Your thought process here]
</scratchpad>

Based on your analysis, provide a detailed justification for your Match Score. Include specific examples from both the resume description and job posting to support your reasoning. Write your justification within <justification> tags.

<justification>
[Your justification here]
</justification>

Finally, provide a Match Score as a percentage, where 100% represents a perfect match and 0% represents no match at all. Consider all aspects of your analysis when determining this score. Present your Match Score within <match_score> tags.

<match_score>
[Your Match Score here]
</match_score>

Remember to be objective and thorough in your analysis, considering all aspects of both the resume description and job posting when determining the Match Score."#;

/// Fills the match-score template with the resume and listing text.
pub fn build_match_score_prompt(resume: &str, job_posting: &str) -> String {
    MATCH_SCORE_TEMPLATE
        .replace("{resume}", resume)
        .replace("{job_posting}", job_posting)
}
