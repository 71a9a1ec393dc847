use crate::ast::*;
use crate::error::DinoResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl Parser<'_> {
    /// Table source followed by any number of joins. FROM is already consumed.
    pub(crate) fn parse_from(&mut self) -> DinoResult<FromClause> {
        let span = self.span();
        let table = self.parse_table_source()?;

        let mut joins = Vec::new();
        while let Some(kind) = self.parse_join_kind()? {
            joins.push(self.parse_join(kind)?);
        }

        Ok(FromClause { table, joins, span })
    }

    fn parse_table_source(&mut self) -> DinoResult<TableSource> {
        let span = self.span();
        let name = self.expect_identifier("Expected table name")?;
        let alias = self.parse_alias("Expected table alias after AS")?;
        Ok(TableSource { name, alias, span })
    }

    /// Consume a join prefix up to and including JOIN.
    fn parse_join_kind(&mut self) -> DinoResult<Option<JoinKind>> {
        let kind = match self.current.kind {
            TokenKind::Join => JoinKind::Inner,
            TokenKind::Inner => JoinKind::Inner,
            TokenKind::Left => JoinKind::Left,
            TokenKind::Right => JoinKind::Right,
            TokenKind::Full => JoinKind::Full,
            TokenKind::Cross => JoinKind::Cross,
            _ => return Ok(None),
        };

        if self.check(TokenKind::Join) {
            self.advance()?;
            return Ok(Some(kind));
        }

        self.advance()?;
        if matches!(kind, JoinKind::Left | JoinKind::Right | JoinKind::Full) {
            self.eat(TokenKind::Outer)?;
        }
        self.expect(TokenKind::Join, "Expected JOIN")?;
        Ok(Some(kind))
    }

    fn parse_join(&mut self, kind: JoinKind) -> DinoResult<JoinClause> {
        let span = self.span();
        let table = self.parse_table_source()?;

        let on = if kind == JoinKind::Cross {
            None
        } else {
            self.expect(TokenKind::On, "Expected ON after join table")?;
            Some(self.parse_expression()?)
        };

        Ok(JoinClause {
            kind,
            table,
            on,
            span,
        })
    }

    /// `GROUP BY expr, ... [HAVING expr]`
    pub(crate) fn parse_group_by(&mut self) -> DinoResult<GroupByClause> {
        let span = self.span();
        self.expect(TokenKind::Group, "Expected GROUP")?;
        self.expect(TokenKind::By, "Expected BY after GROUP")?;

        let mut exprs = vec![self.parse_expression()?];
        while self.eat(TokenKind::Comma)? {
            exprs.push(self.parse_expression()?);
        }

        let having = if self.eat(TokenKind::Having)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(GroupByClause {
            exprs,
            having,
            span,
        })
    }

    /// `ORDER BY expr [ASC|DESC], ...`
    pub(crate) fn parse_order_by(&mut self) -> DinoResult<OrderByClause> {
        let span = self.span();
        self.expect(TokenKind::Order, "Expected ORDER")?;
        self.expect(TokenKind::By, "Expected BY after ORDER")?;

        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let order = if self.eat(TokenKind::Desc)? {
                SortOrder::Descending
            } else {
                self.eat(TokenKind::Asc)?;
                SortOrder::Ascending
            };
            items.push(OrderByItem { expr, order });

            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }

        Ok(OrderByClause { items, span })
    }
}
