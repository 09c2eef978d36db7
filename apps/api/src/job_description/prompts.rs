// Job description generation prompt.
// Replace: {job_title}, {years_of_experience}, {must_have_skills}, {company_name},
//          {employment_type}, {industry}, {location}

pub const GENERATE_JOB_DESCRIPTION_PROMPT: &str = r#"Generate a comprehensive and professional job description for the following role:

Job Title: {job_title}
Years of Experience: {years_of_experience} years
Must-Have Skills: {must_have_skills}
Company Name: {company_name}
Employment Type: {employment_type}
Industry: {industry}
Location: {location}

Include these sections:
1. Job Overview
2. Key Responsibilities (5-7 bullet points)
3. Required Skills and Qualifications
4. Nice-to-Have Skills
5. Work Environment and Benefits
6. How to Apply

Use clear section headers and bullet points. Return only the job description text."#;
