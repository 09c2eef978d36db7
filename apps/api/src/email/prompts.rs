// Outreach email prompts.
// Replace: {candidate_name}, {candidate_email}, {score}, {matching_summary},
//          {job_title}, {company_name}, {manager_name}

pub const INTERVIEW_EMAIL_PROMPT: &str = r#"Generate a professional interview invitation email with personalized insights from resume matching.

CANDIDATE INFO:
Name: {candidate_name}
Email: {candidate_email}
Score: {score}%

RESUME MATCHING SUMMARY:
{matching_summary}

JOB DETAILS:
Position: {job_title}
Company: {company_name}

HIRING MANAGER:
{manager_name}

Write a warm, professional email that congratulates the candidate on being shortlisted,
mentions specific matching skills and strengths from the summary, explains why they fit
the role and proposes scheduling an interview with clear next steps.

Return a JSON object with this EXACT structure:
{
  "subject": "Interview Invitation - [Position] at [Company]",
  "body": "Full email body with line breaks"
}"#;

pub const REJECTION_EMAIL_PROMPT: &str = r#"Generate a respectful rejection email with personalized feedback from resume matching.

CANDIDATE INFO:
Name: {candidate_name}
Email: {candidate_email}
Score: {score}%

RESUME MATCHING SUMMARY:
{matching_summary}

JOB DETAILS:
Position: {job_title}
Company: {company_name}

HIRING MANAGER:
{manager_name}

Write a respectful, encouraging email that thanks the candidate for their time,
acknowledges their strengths, gives constructive feedback drawn from the summary,
delivers the decision clearly and invites future applications.

Return a JSON object with this EXACT structure:
{
  "subject": "Application Update - [Position] at [Company]",
  "body": "Full email body with line breaks"
}"#;
