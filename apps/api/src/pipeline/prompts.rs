// All generation prompt constants for the pipeline stages.
// Placeholders are filled with `.replace` before sending.

/// System prompt for the analyze stage — enforces JSON-only output.
pub const ANALYZE_SYSTEM: &str =
    "You are an expert ATS (Applicant Tracking System) scanner comparing a CV \
    against a job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Analyze prompt template. Replace `{job_description}` and `{cv_text}`.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"Compare the following CV against the Job Description.

JOB DESCRIPTION:
{job_description}

CV CONTENT:
{cv_text}

Return ONLY a JSON object with this exact structure:
{
    "job_title": "extracted job title",
    "company": "extracted company name",
    "ats_score": 85,
    "missing_keywords": ["keyword1", "keyword2", "keyword3"],
    "cv_improvements": "Short summary of what to change in the CV content to target this job."
}"#;

/// System prompt for the CV stage — body-only LaTeX output.
pub const CV_SYSTEM: &str =
    "You are an expert CV tailor producing LaTeX. \
    Return ONLY document body content — never a preamble, \\documentclass, \
    \\begin{document} or \\end{document}.";

/// CV generation prompt template.
/// Replace: `{cv_text}`, `{job_description}`, `{cv_template}`, `{language}`.
pub const CV_PROMPT_TEMPLATE: &str = r#"I have a Master CV containing all my experiences, a Job Description, and a LaTeX CV template.

Your task is to rewrite the BODY of the LaTeX CV to target the Job Description, using the data from the Master CV.

GUIDELINES:
1. **Strict Structure**: You MUST use the exact LaTeX commands and structure defined in the template (e.g., use the defined \entry and \project commands).
2. **Content**: Select the most relevant projects/experiences. Rewrite the 'Profile' and 'Title'.
3. **No Markdown**: Do NOT use markdown formatting (no **, no # headers). Use LaTeX commands (\textbf{...}).
4. **Language**: Write strictly in {language}.
5. **Reference**: Do strictly follow the template's custom commands.
6. **ONE PAGE ONLY**: Keep it concise.
7. **Output Format**: Generate ONLY the LaTeX content for the body.

Master CV (Source of Truth):
{cv_text}

Job Description:
{job_description}

LaTeX CV Template (Structure to follow):
{cv_template}

Return ONLY the content that goes INSIDE \begin{document} ... \end{document}."#;

/// System prompt for the cover-letter stage.
pub const COVER_LETTER_SYSTEM: &str =
    "You are an expert career coach writing cover letters in LaTeX. \
    Return ONLY the letter body — never a preamble or \\documentclass.";

/// Cover-letter prompt template.
/// Replace: `{job_description}`, `{cv_text}`, `{cl_template}`, `{language}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a professional Cover Letter body for the attached Job Description.

JOB DESCRIPTION:
{job_description}

CANDIDATE CV:
{cv_text}

TEMPLATE CONTEXT:
{cl_template}

INSTRUCTIONS:
1. **Format**: Use the exact commands from the template (e.g., \opening, \closing).
2. **Content**: Write 3 paragraphs explaining why the candidate is a fit.
3. **Style**: Professional and enthusiastic. Write strictly in {language}.
4. **Output**: Return ONLY the body content (from \opening to \closing)."#;

/// System prompt for the outreach-message stage.
pub const MESSAGE_SYSTEM: &str =
    "You act as the candidate described in the CV, writing to a recruiter. \
    Return ONLY the message text (Subject + Body) with every placeholder \
    resolved to a concrete value.";

/// Outreach-message prompt template.
/// Replace: `{cv_text}`, `{job_description}`, `{language_name}`.
pub const MESSAGE_PROMPT_TEMPLATE: &str = r#"Write a short, engaging LinkedIn outreach message (<1000 chars) to a recruiter for this Job.

CONTEXT:
- My CV: {cv_text}
- Job Description: {job_description}

INSTRUCTIONS:
1. **Language**: Write strictly in {language_name}.
2. **No Placeholders**: You MUST fill in the names/skills/company.
   - Candidate Name: Extract from CV (if not found, use "The Candidate").
   - Recruiter Name: "Hiring Team" (unless a specific name is found in the JD).
   - Company: Extract from the Job Description.
   - Skills: select real skills from the CV relevant to the JD.
3. **Tone**: Professional, brief, and not robotic.

Return ONLY the message text (Subject + Body)."#;
