//! Practice problem collection
//!
//! A fixed set of worked problems, one per subject and tier. Rendered to
//! Markdown by `tutor report` and used by `tutor ingest --builtin` to seed
//! the knowledge store.

use serde::Serialize;
use tutor_sdk::{Subject, Tier};

pub const COLLECTION_TITLE: &str = "STEM Practice Problems Collection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PracticeProblem {
    pub subject: Subject,
    pub tier: Tier,
    pub title: &'static str,
    pub problem: &'static str,
    pub solution: &'static str,
}

impl PracticeProblem {
    /// Text stored in the knowledge store for this problem
    pub fn document(&self) -> String {
        format!(
            "{}\nProblem:\n{}\n\nSolution:\n{}",
            self.title, self.problem, self.solution
        )
    }
}

const PROBLEMS: [PracticeProblem; 9] = [
    PracticeProblem {
        subject: Subject::Mathematics,
        tier: Tier::Beginner,
        title: "Beginner: Basic Algebra",
        problem: "Solve for x: 3x + 7 = 22",
        solution: "Step 1: Subtract 7 from both sides: 3x = 15\n\
                   Step 2: Divide both sides by 3: x = 5",
    },
    PracticeProblem {
        subject: Subject::Mathematics,
        tier: Tier::Intermediate,
        title: "Intermediate: Quadratic Equations",
        problem: "Solve the quadratic equation: x² - 5x + 6 = 0",
        solution: "Using factoring: (x - 2)(x - 3) = 0\n\
                   Therefore, x = 2 or x = 3",
    },
    PracticeProblem {
        subject: Subject::Mathematics,
        tier: Tier::Advanced,
        title: "Advanced: Calculus",
        problem: "Find the derivative of f(x) = 3x⁴ - 2x³ + 5x - 1",
        solution: "f'(x) = 12x³ - 6x² + 5",
    },
    PracticeProblem {
        subject: Subject::Physics,
        tier: Tier::Beginner,
        title: "Beginner: Kinematics",
        problem: "A car travels at a constant speed of 60 km/h. \
                  How far will it travel in 2.5 hours?",
        solution: "Using d = vt\n\
                   Distance = 60 km/h × 2.5 h = 150 km",
    },
    PracticeProblem {
        subject: Subject::Physics,
        tier: Tier::Intermediate,
        title: "Intermediate: Forces",
        problem: "A 5 kg mass is suspended by two ropes at angles of 30° and 45° \
                  to the horizontal. Find the tension in each rope.",
        solution: "Using force balance equations:\n\
                   T1 cos(30°) = T2 cos(45°)\n\
                   T1 sin(30°) + T2 sin(45°) = 49 N\n\
                   Solving: T1 = 35.7 N, T2 = 30.9 N",
    },
    PracticeProblem {
        subject: Subject::Physics,
        tier: Tier::Advanced,
        title: "Advanced: Electromagnetics",
        problem: "A straight wire of length 2m carries a current of 5A in a magnetic \
                  field of 0.5T perpendicular to the wire. Calculate the force on the wire.",
        solution: "Using F = BIL\n\
                   F = 0.5T × 5A × 2m = 5N",
    },
    PracticeProblem {
        subject: Subject::Chemistry,
        tier: Tier::Beginner,
        title: "Beginner: Balancing Equations",
        problem: "Balance the following chemical equation: H2 + O2 → H2O",
        solution: "Balanced equation: 2H2 + O2 → 2H2O",
    },
    PracticeProblem {
        subject: Subject::Chemistry,
        tier: Tier::Intermediate,
        title: "Intermediate: Stoichiometry",
        problem: "How many grams of oxygen (O2) are needed to completely react with \
                  10 grams of hydrogen (H2) to form water?",
        solution: "Using balanced equation: 2H2 + O2 → 2H2O\n\
                   Molar mass H2 = 2g/mol, O2 = 32g/mol\n\
                   10g H2 × (1 mol H2/2g H2) × (1 mol O2/2 mol H2) × (32g O2/1 mol O2) = 80g O2",
    },
    PracticeProblem {
        subject: Subject::Chemistry,
        tier: Tier::Advanced,
        title: "Advanced: Equilibrium",
        problem: "For the reaction N2 + 3H2 ⇌ 2NH3, the equilibrium constant Kc = 0.5 \
                  at 400°C. Calculate the equilibrium concentrations if initial \
                  concentrations are [N2]0 = 0.8M, [H2]0 = 0.6M, and [NH3]0 = 0.",
        solution: "Using ICE table and equilibrium equations:\n\
                   At equilibrium: [N2] = 0.65M, [H2] = 0.35M, [NH3] = 0.3M",
    },
];

/// The full collection, grouped by subject and ordered by tier
pub fn collection() -> &'static [PracticeProblem] {
    &PROBLEMS
}

/// Problems for one subject
pub fn problems_for(subject: Subject) -> impl Iterator<Item = &'static PracticeProblem> {
    PROBLEMS.iter().filter(move |p| p.subject == subject)
}

/// Render problems as a Markdown document, one section per subject
pub fn render_markdown(problems: &[PracticeProblem]) -> String {
    let mut out = format!("# {}\n", COLLECTION_TITLE);

    for subject in Subject::ALL {
        let section: Vec<&PracticeProblem> =
            problems.iter().filter(|p| p.subject == subject).collect();
        if section.is_empty() {
            continue;
        }

        out.push_str(&format!("\n## {}\n", subject.title()));
        for problem in section {
            out.push_str(&format!(
                "\n### {}\n\n**Problem:**\n\n{}\n\n**Solution:**\n\n{}\n",
                problem.title,
                problem.problem,
                markdown_lines(problem.solution)
            ));
        }
    }

    out
}

/// Hard line breaks so multi-step solutions keep their layout
fn markdown_lines(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("  \n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_problem_per_subject_and_tier() {
        for subject in Subject::ALL {
            let tiers: Vec<Tier> = problems_for(subject).map(|p| p.tier).collect();
            assert_eq!(tiers, Tier::ALL.to_vec(), "{}", subject);
        }
        assert_eq!(collection().len(), 9);
    }

    #[test]
    fn test_titles_carry_tier() {
        for problem in collection() {
            assert!(problem.title.starts_with(problem.tier.as_str()));
        }
    }

    #[test]
    fn test_render_markdown() {
        let markdown = render_markdown(collection());

        assert!(markdown.starts_with("# STEM Practice Problems Collection\n"));
        let math = markdown.find("## Mathematics").unwrap();
        let physics = markdown.find("## Physics").unwrap();
        let chemistry = markdown.find("## Chemistry").unwrap();
        assert!(math < physics && physics < chemistry);

        assert!(markdown.contains("### Beginner: Basic Algebra"));
        assert!(markdown.contains("Step 1: Subtract 7 from both sides: 3x = 15  \nStep 2"));
        assert!(markdown.contains("F = 0.5T × 5A × 2m = 5N"));
        assert!(markdown.contains("[NH3] = 0.3M"));
    }

    #[test]
    fn test_render_subset_skips_empty_sections() {
        let physics: Vec<PracticeProblem> = problems_for(Subject::Physics).copied().collect();
        let markdown = render_markdown(&physics);

        assert!(markdown.contains("## Physics"));
        assert!(!markdown.contains("## Mathematics"));
        assert!(!markdown.contains("## Chemistry"));
    }

    #[test]
    fn test_document_text() {
        let document = collection()[0].document();
        assert!(document.starts_with("Beginner: Basic Algebra\nProblem:\nSolve for x"));
        assert!(document.ends_with("x = 5"));
    }
}
