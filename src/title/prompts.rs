// Book Splitter - Audiobook chapter splitting and tagging
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Language model prompts

/// Prompt asking for the single canonical title of a book
pub fn disambiguation_prompt(filename: &str, candidates: &[String]) -> String {
    let candidate_list = candidates
        .iter()
        .map(|c| format!("  - {}", c))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "I am trying to organize my digital audiobook collection.
I have a file and I'm trying to figure out the title of the book it is for.
The file may contain the whole book or it may be a single chapter.
I also have some candidate titles.
Please consider the filename and candidate titles and give me back what
you think is the title of the book in question.

Some considerations:

- Some titles include an exhortation about the book's place in the
  marketplace (like \"over 7 million copies sold\"). Remove those exhortations.

Do not include ANYTHING else in your response. ONLY the title of the book.

Filename: {}
Candidates:
{}",
        filename, candidate_list
    )
}

/// Prompt asking for a compact form of a title within `budget` characters
pub fn shorten_prompt(title: &str, budget: usize) -> String {
    format!(
        "Shorten the following book title to a concise format under {} characters.
Retain key elements like the main title, important descriptors, and
series/book number (if provided). Use clear wording, and feel free to simplify
or abbreviate where necessary, while keeping the meaning intact. For example,
you can use dashes or parentheses to organize elements.

Respond only with the edited title, no additional words.

The title is: '{}'",
        budget, title
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disambiguation_prompt_lists_every_candidate() {
        let prompt = disambiguation_prompt(
            "dune_01.m4b",
            &["Dune".to_string(), "Dune: 10 Million Copies Sold".to_string()],
        );
        assert!(prompt.contains("Filename: dune_01.m4b"));
        assert!(prompt.contains("  - Dune\n  - Dune: 10 Million Copies Sold"));
        assert!(prompt.contains("ONLY the title"));
    }

    #[test]
    fn test_shorten_prompt_carries_budget() {
        let prompt = shorten_prompt("A Very Long Title", 40);
        assert!(prompt.contains("under 40 characters"));
        assert!(prompt.ends_with("'A Very Long Title'"));
    }
}
