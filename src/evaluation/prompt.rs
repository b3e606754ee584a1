use super::extract::ExtractedTranscript;

pub const EVALUATION_SYSTEM_INSTRUCTION: &str = "أنت خبير موارد بشرية متخصص في تقييم الأداء وتحليل التقييم 360 درجة. قدم تقييمات شاملة ومتوازنة وقابلة للتنفيذ بناءً على مصادر متعددة. كن محدداً وعادلاً وبناءً.";

pub const CUSTOMER_ANALYSIS_SYSTEM_INSTRUCTION: &str = "You are a specialized analyst in evaluating customer behavior and cooperation in Almoayyed (Y.K. Almoayyed & Sons) customer service center. You must assess the customer's behavior and cooperation, NOT the employee. All your responses must be in English only. Provide a comprehensive and detailed analysis focusing on the customer's cooperation, seriousness of their responses, and overall behavior.";

const MISSING_TRANSCRIPT: &str = "لا يوجد نص متاح";

const EVALUATION_RUBRIC: &str = r#"يجب أن يتضمن التقرير:

1. **ملخص الأداء العام** (4-6 جمل):
   - دمج الآراء من جميع المستجيبين
   - تحديد الأنماط والقواسم المشتركة
   - إبراز نقاط القوة والمجالات التي تحتاج تحسين

2. **نقاط القوة الرئيسية** (5-7 نقاط):
   - ما الذي يتقنه الموظف؟
   - ما هي الأنماط الإيجابية المتكررة؟

3. **مجالات التحسين** (5-7 نقاط):
   - ما هي التحديات أو نقاط الضعف؟
   - ما هي المهارات التي تحتاج تطوير؟

4. **مقاييس الأداء**:
   - الأداء العام (1-10)
   - مهارات التواصل (1-10)
   - الكفاءة التقنية (1-10)
   - خدمة العملاء (1-10)
   - العمل الجماعي والتعاون (1-10)
   - حل المشكلات (1-10)

5. **توصيات مفصلة** (7-10 توصيات قابلة للتنفيذ):
   - خطوات محددة للتحسين
   - اقتراحات للتدريب والتطوير
   - أفضل الممارسات للحفاظ على نقاط القوة

6. **تحليل التقييم 360 درجة**:
   - كيف ينظر الأشخاص من أدوار مختلفة للموظف؟
   - هل هناك آراء متضاربة؟
   - ماذا يكشف هذا عن أسلوب عمل الموظف؟

7. **اقتراحات التطوير المهني** (3-5 نقاط):
   - الخطوات التالية للنمو
   - مسارات مهنية محتملة
   - مهارات يجب تطويرها للترقية

قدم تقييماً شاملاً ومتوازناً وقابلة للتنفيذ بناءً على مصادر متعددة. كن محدداً وعادلاً وبناءً."#;

const CUSTOMER_ANALYSIS_INSTRUCTIONS: &str = r#"**First: Extract the customer name from the conversation** - Look for the name mentioned by the customer or agent at the beginning of the conversation.

**Second: Determine customer mood from the conversation tone and responses** - Classify into ONE word only: happy, satisfied, neutral, frustrated, or angry

Provide a comprehensive assessment of the customer's behavior and cooperation (NOT the employee):

1. **Customer Cooperation Assessment** (1-10):
   - Is the customer cooperative and willing to engage?
   - Did the customer respond to questions and inquiries?
   - Was the customer friendly and polite in communication?

2. **Customer Response Quality Assessment** (1-10):
   - Did the customer answer questions clearly and completely?
   - Were their answers helpful and reliable?
   - Did the customer show interest or was indifferent?

3. **Is the customer stubborn or insisting on something specific?** (Yes/No - with explanation)

4. **Key Discussion Points (7-12 points)**:
   Extract the most important points discussed in the call:
   - What was the main topic or issue the customer called about?
   - What specific information or requests did the customer provide?
   - Was a solution or agreement reached? What was it?
   - Did the customer request additional services or specific information?
   - Did the customer mention any viewpoints or important observations?
   - Was there any commitment or appointment set?
   - Were there follow-up steps or required actions identified?
   - Did the customer mention any complaints or praise?
   - What are the most important things to remember about this customer?

5. **7-10 Key Points about Customer Behavior**:
   - Customer's willingness to engage and communicate
   - Level of cooperation with the agent
   - Nature of responses and how they replied
   - Level of engagement with the topic and discussion
   - Any reservations or objections from the customer
   - Apparent satisfaction level from the customer
   - Seriousness in dialogue and inquiries

6. **Comprehensive Summary of Customer Behavior and Cooperation** (5-7 sentences):
   - Description of customer's general behavior
   - Level of cooperation and responsiveness
   - Positive observations about their behavior
   - Any indicators of dissatisfaction or stubbornness
   - Final assessment of interaction quality from customer's side

7. **10 Assessment Questions for Employee Performance with Detailed Answers**:
   1. Was the customer greeted professionally and warmly?
   2. Did the employee understand the customer's problem correctly?
   3. Was the information provided accurate and current?
   4. Did the employee show high problem-solving capabilities?
   5. Was the employee patient and interested in customer needs?
   6. Was the employee's language clear and easy to understand?
   7. Did the employee give the customer enough time to ask and clarify?
   8. Did the employee end the call professionally with solution confirmation?
   9. Did the employee appear well-trained on services and products?
   10. Was the employee's experience professional and committed to customer satisfaction?

   For each question: Provide complete answer and assessment (Excellent/Very Good/Good/Average/Poor)

8. **3-5 Recommendations for Improving Employee Performance**:
   - Strengths to maintain
   - Suggested improvement areas
   - Practical tips for better performance

9. **Overall Employee Performance Score** (1-10):
   Criteria:
   - Professionalism and customer handling (30%)
   - Service quality and solution provided (40%)
   - Response speed and efficiency (30%)

10. **Customer Overall Cooperation and Behavior Score** (1-10):
   Criteria:
   - Cooperation and willingness to engage (35%)
   - Quality and completeness of answers (35%)
   - Friendliness and politeness in communication (30%)

⚠️ CRITICAL:
- All assessments must be for the CUSTOMER not the employee
- All text and assessments must be in ENGLISH only
- Focus on customer behavior, cooperation, and seriousness of responses
- Extract customer name from conversation and provide it in customerName field
- Determine customer mood as ONE word: happy, satisfied, neutral, frustrated, or angry
- Extract discussion points in detail and helpfully ⚠️"#;

/// 360° evaluation prompt over every usable transcript. `transcripts` must
/// not be empty; the pipeline rejects that case before building a prompt.
pub fn build_evaluation_prompt(employee_name: &str, transcripts: &[ExtractedTranscript]) -> String {
    let calls = transcripts
        .iter()
        .enumerate()
        .map(|(idx, call)| render_call(idx + 1, call))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "أنت خبير في تقييم أداء الموظفين باستخدام منهجية التقييم 360 درجة.\n\n\
         **الموظف المراد تقييمه: {name}**\n\n\
         لقد تم إجراء {count} مكالمات مع أشخاص مختلفين لجمع آرائهم حول أداء هذا الموظف.\n\n\
         {calls}\n\n\
         **المطلوب منك:**\n\n\
         قم بتحليل جميع المكالمات أعلاه وإنشاء تقرير تقييمي شامل عن أداء الموظف {name}.\n\n\
         {rubric}",
        name = employee_name,
        count = transcripts.len(),
        calls = calls,
        rubric = EVALUATION_RUBRIC,
    )
}

fn render_call(number: usize, call: &ExtractedTranscript) -> String {
    let transcript = if call.transcript.is_empty() {
        MISSING_TRANSCRIPT
    } else {
        call.transcript.as_str()
    };
    format!(
        "\n---\n**المكالمة {number}:**\n\
         المستجيب: {name}\n\
         الدور: {role}\n\
         مدة المكالمة: {minutes} دقيقة\n\n\
         **نص المحادثة:**\n\
         {transcript}\n---\n",
        number = number,
        name = call.respondent_name,
        role = call.respondent_role,
        minutes = call.duration_minutes(),
        transcript = transcript,
    )
}

pub fn build_customer_analysis_prompt(transcript: &str) -> String {
    format!(
        "⚠️ IMPORTANT: All output must be in English only ⚠️\n\n\
         Analyze this call transcript from Almoayyed (Y.K. Almoayyed & Sons) customer service center:\n\n\
         {}\n\n{}",
        transcript, CUSTOMER_ANALYSIS_INSTRUCTIONS
    )
}

const CALL_ANALYSIS_FORMAT_AR: &str = r#"قدم التحليل التالي بصيغة JSON:

{
  "customerCooperation": {
    "score": (رقم من 1-10),
    "assessment": "تقييم مفصل لمدى تعاون العميل"
  },
  "engagement": {
    "score": (رقم من 1-10),
    "assessment": "تقييم مدى تفاعل العميل"
  },
  "issueResolved": {
    "resolved": (true/false),
    "details": "تفاصيل إن وجدت"
  },
  "keyPoints": [
    "النقطة الأولى المهمة",
    "النقطة الثانية المهمة",
    "النقطة الثالثة المهمة"
  ],
  "assessmentQuestions": [
    {
      "question": "هل تم التعريف بالهوية بشكل صحيح؟",
      "answer": "نعم/لا",
      "status": "ناجح/فاشل",
      "details": "تفاصيل إضافية"
    }
  ],
  "summary": "ملخص شامل للمكالمة (3-5 جمل)",
  "recommendations": [
    "توصية 1",
    "توصية 2"
  ],
  "overallScore": (رقم من 1-10)
}"#;

const CALL_ANALYSIS_FORMAT_EN: &str = r#"Provide the analysis in JSON format:

{
  "customerCooperation": {
    "score": (number 1-10),
    "assessment": "detailed assessment of customer cooperation"
  },
  "engagement": {
    "score": (number 1-10),
    "assessment": "assessment of customer engagement level"
  },
  "issueResolved": {
    "resolved": (true/false),
    "details": "details if any"
  },
  "keyPoints": [
    "first key discussion point",
    "second key discussion point",
    "third key discussion point"
  ],
  "assessmentQuestions": [
    {
      "question": "Was proper identification provided?",
      "answer": "Yes/No",
      "status": "Pass/Fail",
      "details": "additional details"
    }
  ],
  "summary": "comprehensive call summary (3-5 sentences)",
  "recommendations": [
    "recommendation 1",
    "recommendation 2"
  ],
  "overallScore": (number 1-10)
}"#;

pub fn call_analysis_system_instruction(language: ScriptLanguage) -> &'static str {
    match language {
        ScriptLanguage::Arabic => "أنت محلل مكالمات خبير لمركز اتصالات المؤيد. اكتب التحليل باللغة العربية.",
        ScriptLanguage::English => "You are an expert call analyst for Almoayyed call center.",
    }
}

/// Single-call quality analysis in the caller's language.
pub fn build_call_analysis_prompt(transcript: &str, language: ScriptLanguage) -> String {
    match language {
        ScriptLanguage::Arabic => format!(
            "أنت محلل مكالمات خبير لمركز اتصالات المؤيد. قم بتحليل النص التالي للمكالمة وقدم تقريراً شاملاً باللغة العربية.\n\n\
             نص المكالمة:\n{}\n\n{}",
            transcript, CALL_ANALYSIS_FORMAT_AR
        ),
        ScriptLanguage::English => format!(
            "You are an expert call analyst for Almoayyed call center. Analyze the following call transcript and provide a comprehensive report.\n\n\
             Call Transcript:\n{}\n\n{}",
            transcript, CALL_ANALYSIS_FORMAT_EN
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLanguage {
    English,
    Arabic,
}

impl ScriptLanguage {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ar" => ScriptLanguage::Arabic,
            _ => ScriptLanguage::English,
        }
    }
}

/// How the voice agent refers to the contact's relationship with the employee.
pub fn role_context(role: Option<&str>, language: ScriptLanguage) -> &'static str {
    match (language, role.unwrap_or_default()) {
        (ScriptLanguage::Arabic, "manager") => "مديرهم",
        (ScriptLanguage::Arabic, "colleague") => "زميلهم في العمل",
        (ScriptLanguage::Arabic, "subordinate") => "أحد مرؤوسيهم",
        (ScriptLanguage::Arabic, "partner") => "شريك عملهم",
        (ScriptLanguage::Arabic, _) => "زميل",
        (ScriptLanguage::English, "manager") => "manager",
        (ScriptLanguage::English, "colleague") => "work colleague",
        (ScriptLanguage::English, "subordinate") => "subordinate",
        (ScriptLanguage::English, "partner") => "business partner",
        (ScriptLanguage::English, _) => "colleague",
    }
}

/// Instructions for the voice agent placing a 360° evaluation call.
pub fn build_call_script(
    employee_name: &str,
    employee_position: &str,
    contact_role: Option<&str>,
    language: ScriptLanguage,
) -> String {
    let role = role_context(contact_role, language);
    match language {
        ScriptLanguage::English => format!(
            "You are an AI evaluation assistant from the Oman Ministry of Transport and Communications.\n\n\
             You are conducting a professional performance evaluation for {name}, who works as {position}.\n\n\
             You are speaking with someone who is their {role}.\n\n\
             Your objectives:\n\
             1. Introduce yourself professionally and explain the purpose of the call\n\
             2. Ask about their working relationship with {name}\n\
             3. Evaluate {name}'s performance in the following areas:\n   \
             - Communication skills and professionalism\n   \
             - Technical competence and job knowledge\n   \
             - Teamwork and collaboration\n   \
             - Problem-solving abilities\n   \
             - Reliability and punctuality\n   \
             - Leadership qualities (if applicable)\n\
             4. Ask for specific examples of strengths and areas for improvement\n\
             5. Collect an overall performance rating on a scale of 1-10\n\
             6. Ask if they have any additional comments or feedback\n\n\
             Be professional, respectful, and objective. Listen carefully and probe for specific examples. \
             Keep the conversation focused and aim to complete the evaluation in 5-7 minutes.\n\n\
             Thank them for their time and valuable feedback.",
            name = employee_name,
            position = employee_position,
            role = role,
        ),
        ScriptLanguage::Arabic => format!(
            "أنت مساعد تقييم ذكي من وزارة النقل والاتصالات العمانية.\n\n\
             أنت تجري تقييم أداء مهني لـ {name}، الذي يعمل كـ {position}.\n\n\
             أنت تتحدث مع شخص هو {role}.\n\n\
             أهدافك:\n\
             1. قدم نفسك بشكل احترافي واشرح الغرض من المكالمة\n\
             2. اسأل عن علاقة العمل مع {name}\n\
             3. قيّم أداء {name} في المجالات التالية:\n   \
             - مهارات التواصل والاحترافية\n   \
             - الكفاءة التقنية والمعرفة الوظيفية\n   \
             - العمل الجماعي والتعاون\n   \
             - قدرات حل المشكلات\n   \
             - الموثوقية والالتزام بالمواعيد\n   \
             - القيادة (إن وجدت)\n\
             4. اطلب أمثلة محددة على نقاط القوة ومجالات التحسين\n\
             5. احصل على تقييم أداء عام على مقياس من 1-10\n\
             6. اسأل إذا كان لديهم أي تعليقات أو ملاحظات إضافية\n\n\
             كن محترفاً ومحترماً وموضوعياً. استمع بعناية واطلب أمثلة محددة. \
             حافظ على تركيز المحادثة واهدف لإكمال التقييم في 5-7 دقائق.\n\n\
             اشكرهم على وقتهم وملاحظاتهم القيمة.",
            name = employee_name,
            position = employee_position,
            role = role,
        ),
    }
}
