// LLM prompt templates for extraction and scoring.
// Placeholders are substituted with `str::replace` before sending.

/// Resume extraction prompt. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACTION_PROMPT: &str = r#"You are an expert resume parser. Extract accurate information from this resume.

RESUME:
{resume_text}

Return a JSON object with this EXACT structure:
{
  "personal_info": {
    "name": "extracted name or Not specified",
    "email": "extracted email or Not specified",
    "phone": "extracted phone or Not specified",
    "location": "extracted location or Not specified"
  },
  "professional_summary": "2-3 sentence summary of background and expertise",
  "experience": {
    "total_years": 0,
    "relevant_experience": "Brief description of relevant work",
    "companies": ["Company1", "Company2"],
    "roles": ["Role1", "Role2"]
  },
  "skills": {
    "technical_skills": ["Skill1", "Skill2"],
    "soft_skills": ["Skill1", "Skill2"],
    "certifications": ["Cert1"]
  },
  "education": {
    "highest_degree": "Degree and field",
    "university": "University name or Not specified",
    "year": "Year or Not specified"
  },
  "strengths": ["Strength1", "Strength2", "Strength3"]
}

RULES:
1. Extract skills wherever they appear (summary, experience, projects), not only from a Skills section.
2. Use [] for missing lists, "Not specified" for missing text and 0 for missing numbers.
3. total_years is a whole number of years of professional experience.
4. Do NOT invent details that are not in the resume."#;

/// Job description extraction prompt. Replace `{job_description}` before sending.
pub const JOB_EXTRACTION_PROMPT: &str = r#"You are an expert job description analyzer. Extract the key information from this job description.

JOB DESCRIPTION:
{job_description}

Return a JSON object with this EXACT structure:
{
  "job_title": "extracted job title",
  "requirements": {
    "years_of_experience": 0,
    "required_skills": ["Skill1", "Skill2"],
    "nice_to_have_skills": ["Skill1"]
  },
  "responsibilities": ["Responsibility1", "Responsibility2"],
  "qualifications": {
    "required": ["Qualification1"],
    "preferred": ["Qualification1"]
  },
  "company_info": {
    "company_name": "Company or Not specified",
    "location": "Location or Not specified",
    "employment_type": "Full-time/Part-time/Contract or Not specified"
  }
}

Use [] for missing lists and "Not specified" for missing text. Keep each skill to a short noun phrase ("Python", "AWS", "Kubernetes")."#;

/// Match scoring prompt.
/// Replace: {resume_summary}, {job_summary}, {resume_text}, {job_text}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter. Evaluate how well the candidate fits the role.

CANDIDATE PROFILE SUMMARY:
{resume_summary}

JOB REQUIREMENTS SUMMARY:
{job_summary}

RESUME (first 1500 characters):
{resume_text}

JOB DESCRIPTION (first 1500 characters):
{job_text}

Return a JSON object with this EXACT structure:
{
  "score": 85,
  "matching_skills": ["Skill1", "Skill2"],
  "missing_skills": ["Skill3"],
  "strengths": ["Strength1", "Strength2"],
  "weaknesses": ["Weakness1"],
  "remarks": "2-4 sentence summary of overall fit with key strengths and weaknesses."
}

SCORING RUBRIC (score = sum of the four parts):
- Skills match: 0-70. Alignment of explicit and implied skills with the job requirements.
- Experience relevance: 0-10. Duration and relevance of experience for the role.
- Education relevance: 0-10. Whether the educational background supports the job domain.
- Overall fit: 0-10. Versatility and overall alignment.
Each part MUST stay within its range. Only report the final total as "score" (0-100).

SCORE BANDS:
- 90-100: exceeds most requirements
- 75-89: meets nearly all core skills
- 60-74: meets most key skills, misses some
- 40-59: lacks multiple important requirements
- 0-39: major skill and experience gaps

RULES:
- missing_skills: only skills the job asks for that the resume does not show.
- matching_skills: skills the job asks for that the resume shows directly or through closely related work.
- strengths and weaknesses: at most 5 short phrases each."#;
