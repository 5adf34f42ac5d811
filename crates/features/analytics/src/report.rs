use fxhash::{FxHashMap, FxHashSet};
use rollcall_attendance::AttendanceRecord;
use rollcall_courses::Course;
use rollcall_derive::api_model;
use std::collections::BTreeMap;
use std::fmt;

/// Turnout of one session date.
#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// `YYYY-MM-DD`
    pub session_date: String,
    pub check_ins: u32,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct StudentSummary {
    pub student_id: String,
    pub sessions_attended: u32,
    /// Attended sessions over all sessions of the course, `0.0..=1.0`
    pub attendance_rate: f64,
}

/// Attendance aggregates of one course.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct CourseReport {
    pub course_id: String,
    pub course_code: String,
    pub course_name: String,
    pub total_check_ins: u32,
    pub distinct_students: u32,
    /// Ascending by date
    pub sessions: Vec<SessionSummary>,
    /// Highest rate first
    pub students: Vec<StudentSummary>,
    pub average_check_ins_per_session: f64,
    /// Earliest of the best-attended sessions
    pub peak_session: Option<SessionSummary>,
    /// Unix milliseconds
    pub generated_at: i64,
}

impl CourseReport {
    /// Aggregates `records`, which must all belong to `course`.
    #[must_use]
    pub fn build(course: &Course, records: &[AttendanceRecord], generated_at: i64) -> Self {
        let mut per_session: BTreeMap<&str, u32> = BTreeMap::new();
        let mut per_student: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
        for record in records {
            *per_session.entry(record.session_date.as_str()).or_default() += 1;
            per_student
                .entry(record.student_id.as_str())
                .or_default()
                .insert(record.session_date.as_str());
        }

        let sessions: Vec<SessionSummary> = per_session
            .into_iter()
            .map(|(date, check_ins)| SessionSummary { session_date: date.to_owned(), check_ins })
            .collect();
        let session_count = count(sessions.len());

        let mut students: Vec<StudentSummary> = per_student
            .into_iter()
            .map(|(student_id, dates)| {
                let attended = count(dates.len());
                StudentSummary {
                    student_id: student_id.to_owned(),
                    sessions_attended: attended,
                    attendance_rate: ratio(attended, session_count),
                }
            })
            .collect();
        students.sort_by(|a, b| {
            b.attendance_rate
                .total_cmp(&a.attendance_rate)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });

        let total = count(records.len());
        let peak_session = sessions
            .iter()
            .fold(None::<&SessionSummary>, |best, s| match best {
                Some(b) if b.check_ins >= s.check_ins => Some(b),
                _ => Some(s),
            })
            .cloned();

        Self {
            course_id: course.course_id.clone(),
            course_code: course.code.clone(),
            course_name: course.name.clone(),
            total_check_ins: total,
            distinct_students: count(students.len()),
            average_check_ins_per_session: ratio(total, session_count),
            peak_session,
            sessions,
            students,
            generated_at,
        }
    }

    /// Plain-text rendering used as the report message body.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CourseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Attendance report: {} {}", self.course_code, self.course_name)?;
        writeln!(f)?;
        writeln!(f, "Sessions:          {}", self.sessions.len())?;
        writeln!(f, "Check-ins:         {}", self.total_check_ins)?;
        writeln!(f, "Students:          {}", self.distinct_students)?;
        writeln!(f, "Avg per session:   {:.1}", self.average_check_ins_per_session)?;
        if let Some(peak) = &self.peak_session {
            writeln!(f, "Best turnout:      {} ({})", peak.session_date, peak.check_ins)?;
        }

        if !self.sessions.is_empty() {
            writeln!(f)?;
            writeln!(f, "By session:")?;
            for session in &self.sessions {
                writeln!(f, "  {}  {}", session.session_date, session.check_ins)?;
            }
        }
        if !self.students.is_empty() {
            writeln!(f)?;
            writeln!(f, "By student:")?;
            for student in &self.students {
                writeln!(
                    f,
                    "  {}  {}/{}  {:.0}%",
                    student.student_id,
                    student.sessions_attended,
                    self.sessions.len(),
                    student.attendance_rate * 100.0
                )?;
            }
        }
        Ok(())
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 { 0.0 } else { f64::from(numerator) / f64::from(denominator) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Course {
        Course {
            course_id: "c1".into(),
            professor_id: "p1".into(),
            name: "Compilers".into(),
            code: "CS420".into(),
            description: None,
            geofence: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn record(student: &str, date: &str) -> AttendanceRecord {
        AttendanceRecord {
            record_id: format!("{student}-{date}"),
            course_id: "c1".into(),
            student_id: student.into(),
            session_date: date.into(),
            checked_in_at: 0,
            latitude: None,
            longitude: None,
            accuracy_m: None,
            distance_m: None,
        }
    }

    #[test]
    fn empty_course() {
        let report = CourseReport::build(&course(), &[], 42);
        assert_eq!(report.total_check_ins, 0);
        assert_eq!(report.distinct_students, 0);
        assert!(report.sessions.is_empty());
        assert!(report.students.is_empty());
        assert!(report.peak_session.is_none());
        assert!(report.average_check_ins_per_session.abs() < f64::EPSILON);
        assert_eq!(report.generated_at, 42);
        assert!(report.render_text().contains("Check-ins:         0"));
    }

    #[test]
    fn single_session() {
        let records = [record("s1", "2025-03-10"), record("s2", "2025-03-10")];
        let report = CourseReport::build(&course(), &records, 0);

        assert_eq!(report.sessions, vec![SessionSummary {
            session_date: "2025-03-10".into(),
            check_ins: 2
        }]);
        assert_eq!(report.distinct_students, 2);
        assert!(report.students.iter().all(|s| (s.attendance_rate - 1.0).abs() < f64::EPSILON));
        assert!((report.average_check_ins_per_session - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_attendance_over_several_sessions() {
        let records = [
            record("s2", "2025-03-12"),
            record("s1", "2025-03-10"),
            record("s1", "2025-03-11"),
            record("s1", "2025-03-12"),
            record("s2", "2025-03-10"),
            record("s3", "2025-03-11"),
        ];
        let report = CourseReport::build(&course(), &records, 0);

        let dates: Vec<_> = report.sessions.iter().map(|s| s.session_date.as_str()).collect();
        assert_eq!(dates, ["2025-03-10", "2025-03-11", "2025-03-12"]);
        assert_eq!(report.total_check_ins, 6);
        assert_eq!(report.distinct_students, 3);
        assert!((report.average_check_ins_per_session - 2.0).abs() < f64::EPSILON);

        let ids: Vec<_> = report.students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
        assert_eq!(report.students[0].sessions_attended, 3);
        assert!((report.students[1].attendance_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((report.students[2].attendance_rate - 1.0 / 3.0).abs() < 1e-9);

        // Every session has two check-ins; the earliest wins the tie.
        assert_eq!(report.peak_session.unwrap().session_date, "2025-03-10");
    }

    #[test]
    fn peak_is_the_busiest_session() {
        let records = [
            record("s1", "2025-03-10"),
            record("s1", "2025-03-11"),
            record("s2", "2025-03-11"),
        ];
        let report = CourseReport::build(&course(), &records, 0);
        let peak = report.peak_session.clone().unwrap();
        assert_eq!((peak.session_date.as_str(), peak.check_ins), ("2025-03-11", 2));

        let text = report.render_text();
        assert!(text.starts_with("Attendance report: CS420 Compilers"));
        assert!(text.contains("Best turnout:      2025-03-11 (2)"));
        assert!(text.contains("  s2  1/2  50%"));
    }

    #[test]
    fn text_lists_sessions_then_students() {
        let records = [record("s1", "2025-03-10"), record("s2", "2025-03-11")];
        let report = CourseReport::build(&course(), &records, 0);

        let text = report.render_text();
        assert_eq!(text, format!("{report}"));
        let lines: Vec<&str> = text.lines().collect();
        let by_session = lines.iter().position(|l| *l == "By session:").unwrap();
        let by_student = lines.iter().position(|l| *l == "By student:").unwrap();
        assert!(by_session < by_student);
        assert_eq!(lines[by_session + 1], "  2025-03-10  1");
        assert_eq!(lines[by_student + 1], "  s1  1/2  50%");
        assert!(text.ends_with('\n'));
    }
}
